use std::path::Path;

use anyhow::Result;

use crate::application::IndexedCollection;
use crate::DomainError;

use super::super::Container;

pub struct IndexController<'a> {
    container: &'a Container,
}

impl<'a> IndexController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn index(
        &self,
        path: String,
        collection: String,
        extensions: Vec<String>,
    ) -> Result<String> {
        let loader = self.container.source_loader(&extensions);
        let documents = loader.load(Path::new(&path)).await?;

        match self
            .container
            .pipeline()
            .index_persistent(&collection, &documents)
            .await
        {
            Ok(indexed) => Ok(self.format_index_success(&path, &indexed)),
            Err(e @ DomainError::NoChunksProduced(_)) => Ok(format!(
                "{}\nTry --strategy fixed, or --lenient-parse for files with syntax errors.",
                e
            )),
            Err(e) => Err(e.into()),
        }
    }

    fn format_index_success(&self, path: &str, indexed: &IndexedCollection) -> String {
        if indexed.is_empty() {
            return format!(
                "No matching source files under {}; collection {} is unchanged.",
                path,
                indexed.handle().name()
            );
        }

        format!(
            "Indexed {} ({} files, {} chunks, {}) into collection {}",
            path,
            indexed.document_count(),
            indexed.chunk_count(),
            self.container.strategy(),
            indexed.handle().name()
        )
    }
}
