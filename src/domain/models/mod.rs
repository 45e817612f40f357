mod code_chunk;
mod collection;
mod document;
mod embedding;
mod language;
mod search_result;
mod syntax;

pub use code_chunk::*;
pub use collection::*;
pub use document::*;
pub use embedding::*;
pub use language::*;
pub use search_result::*;
pub use syntax::*;
