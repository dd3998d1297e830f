//! Editor state
//!
//! - [`SearchEngine`] - In-document search and replace over document positions
//! - [`EditorSession`] - Context object for the page open in the editor

pub mod search;
pub mod session;

pub use search::{find_matches, Decoration, SearchEngine, SearchMatch};
pub use session::{EditorSession, Selection};
