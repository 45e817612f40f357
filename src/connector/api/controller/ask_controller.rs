use std::path::Path;

use anyhow::Result;

use crate::{DomainError, Retrieval, RetrievalOptions};

use super::super::Container;

/// Answers questions from a stored collection (`ask`) or from a directory
/// indexed just for this request (`scan`).
pub struct AskController<'a> {
    container: &'a Container,
}

impl<'a> AskController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn ask(
        &self,
        question: String,
        collection: String,
        options: RetrievalOptions,
        json: bool,
    ) -> Result<String> {
        let handle = self
            .container
            .vector_repo()
            .open_collection(&collection)
            .await?;

        let outcome = self
            .container
            .pipeline()
            .retrieve(&handle, &question, &options)
            .await;
        self.render(outcome, &options, json)
    }

    pub async fn scan(
        &self,
        path: String,
        question: String,
        extensions: Vec<String>,
        options: RetrievalOptions,
        json: bool,
    ) -> Result<String> {
        let loader = self.container.source_loader(&extensions);
        let documents = loader.load(Path::new(&path)).await?;

        let outcome = self
            .container
            .pipeline()
            .retrieve_from_documents(&documents, &question, &options)
            .await;
        self.render(outcome, &options, json)
    }

    fn render(
        &self,
        outcome: Result<Retrieval, DomainError>,
        options: &RetrievalOptions,
        json: bool,
    ) -> Result<String> {
        match outcome {
            Ok(retrieval) if json => Ok(serde_json::to_string_pretty(&retrieval)?),
            Ok(retrieval) => Ok(format_retrieval(&retrieval, options)),
            Err(e) if e.is_user_facing() => Ok(e.to_string()),
            Err(e) => Err(e.into()),
        }
    }
}

fn format_retrieval(retrieval: &Retrieval, options: &RetrievalOptions) -> String {
    match retrieval {
        Retrieval::EmptyCollection => "The collection is empty; nothing to retrieve.".to_string(),
        Retrieval::NoneRelevant { nearest_distance } => format!(
            "No relevant code found within distance {:.3} (nearest match at {:.3}).",
            options.distance_threshold(),
            nearest_distance
        ),
        Retrieval::Relevant { results } | Retrieval::Fallback { results } => {
            let mut output = if retrieval.is_fallback() {
                format!(
                    "Nothing within distance {:.3}; returning all {} indexed chunks:\n\n",
                    options.distance_threshold(),
                    results.len()
                )
            } else {
                format!("Found {} relevant chunks:\n\n", results.len())
            };

            for (i, result) in results.iter().enumerate() {
                output.push_str(&format!("{}. {}\n", i + 1, result.display_line()));

                if let Some(name) = result.chunk().symbol_name() {
                    output.push_str(&format!(
                        "   Symbol: {} ({})\n",
                        name,
                        result.chunk().node_type()
                    ));
                }

                for line in result.content().lines().take(10) {
                    output.push_str(&format!("   | {}\n", line));
                }
                output.push('\n');
            }

            output
        }
    }
}
