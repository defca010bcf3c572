//! Public types exposed by the `postindex-core` crate.

pub mod bundle;
pub mod options;
pub mod post;
pub mod symbol;
pub mod theme;

pub use bundle::{BundleStats, Fingerprint, IndexBundle};
pub use options::{IndexOptions, IndexOptionsBuilder};
pub use post::{ImageAttachment, PostId, PostRecord, PostReference, PostStore};
pub use symbol::{SymbolCatalog, SymbolEntry};
pub use theme::{MatchMode, ThemeCatalog, ThemeRule};
