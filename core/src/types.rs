//! Folder listing model built from an `api/xml` response.
//!
//! # Design
//! A folder query answers with a `<folder>` root holding one `<job>` per
//! child, each tagged with an `_class` attribute and carrying a `<url>`.
//! Entries are read straight off the parsed tree: one entry per `url`
//! element under each `/folder/job`, in document order. Anything that is not
//! a `folder` document yields an empty listing.

use crate::xml::Document;

pub const FREESTYLE_CLASS: &str = "hudson.model.FreeStyleProject";
pub const FOLDER_CLASS: &str = "com.cloudbees.hudson.plugins.folder.Folder";

/// The `_class` of a listed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobClass {
    FreeStyle,
    Folder,
    Other(String),
}

impl JobClass {
    pub fn from_class(class: &str) -> Self {
        match class {
            FREESTYLE_CLASS => JobClass::FreeStyle,
            FOLDER_CLASS => JobClass::Folder,
            other => JobClass::Other(other.to_string()),
        }
    }
}

/// One job or folder listed under a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEntry {
    pub class: JobClass,
    pub name: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderListing {
    pub entries: Vec<JobEntry>,
}

impl FolderListing {
    pub fn from_document(doc: &Document) -> Self {
        let Some(folder) = doc.root_element().filter(|&id| doc[id].element().is_some_and(|e| e.is("folder")))
        else {
            return Self::default();
        };

        let mut entries = Vec::new();
        for job in doc.child_elements(folder, "job") {
            // Entries without a class cannot match either selector.
            let Some(class) = doc.attr(job, "_class") else {
                continue;
            };
            let class = JobClass::from_class(class);
            let name = doc.child_elements(job, "name").next().map(|id| doc.inner_text(id));
            for url in doc.child_elements(job, "url") {
                entries.push(JobEntry {
                    class: class.clone(),
                    name: name.clone(),
                    url: doc.inner_text(url),
                });
            }
        }
        Self { entries }
    }

    /// URLs of plain freestyle jobs.
    pub fn jobs(&self) -> impl Iterator<Item = &str> {
        self.urls_of(JobClass::FreeStyle)
    }

    /// URLs of sub-folders.
    pub fn folders(&self) -> impl Iterator<Item = &str> {
        self.urls_of(JobClass::Folder)
    }

    fn urls_of(&self, class: JobClass) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |entry| entry.class == class)
            .map(|entry| entry.url.as_str())
    }
}
