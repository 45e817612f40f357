pub mod ask_controller;
pub mod collection_controller;
pub mod index_controller;

pub use ask_controller::AskController;
pub use collection_controller::CollectionController;
pub use index_controller::IndexController;
