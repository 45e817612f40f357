use anyhow::Result;

use crate::Commands;

use super::container::Container;
use super::controller::{AskController, CollectionController, IndexController};

pub struct Router<'a> {
    index_controller: IndexController<'a>,
    ask_controller: AskController<'a>,
    collection_controller: CollectionController<'a>,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            index_controller: IndexController::new(container),
            ask_controller: AskController::new(container),
            collection_controller: CollectionController::new(container),
        }
    }

    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Index {
                path,
                collection,
                extensions,
            } => {
                self.index_controller
                    .index(path, collection, extensions)
                    .await
            }
            Commands::Ask {
                question,
                collection,
                retrieval,
            } => {
                self.ask_controller
                    .ask(question, collection, retrieval.options(), retrieval.json)
                    .await
            }
            Commands::Scan {
                path,
                question,
                extensions,
                retrieval,
            } => {
                self.ask_controller
                    .scan(path, question, extensions, retrieval.options(), retrieval.json)
                    .await
            }
            Commands::List => self.collection_controller.list().await,
            Commands::Drop { collection } => self.collection_controller.drop(collection).await,
        }
    }
}
