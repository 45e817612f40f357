use anyhow::Result;

use crate::CollectionInfo;

use super::super::Container;

pub struct CollectionController<'a> {
    container: &'a Container,
}

impl<'a> CollectionController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn list(&self) -> Result<String> {
        let collections = self.container.vector_repo().list_collections().await?;
        Ok(self.format_collection_list(&collections))
    }

    pub async fn drop(&self, name: String) -> Result<String> {
        let repo = self.container.vector_repo();
        let handle = repo.open_collection(&name).await?;
        let chunk_count = repo.count(&handle).await?;
        repo.drop_collection(&handle).await?;

        Ok(format!(
            "Dropped collection {} ({} chunks).",
            handle.name(),
            chunk_count
        ))
    }

    fn format_collection_list(&self, collections: &[CollectionInfo]) -> String {
        if collections.is_empty() {
            return "No collections.".to_string();
        }

        let mut output = "Collections:\n\n".to_string();
        for info in collections {
            output.push_str(&format!(
                "  {} ({}): {} chunks\n",
                info.name, info.kind, info.chunk_count
            ));
        }
        output.push_str(&format!("\nData Dir: {}\n", self.container.data_dir()));
        output
    }
}
