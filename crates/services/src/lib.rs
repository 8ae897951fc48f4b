//! Remote services behind small async traits: text completion, image search,
//! and image download, plus the outline and image stages built on them.

pub mod completion;
pub mod fetch;
pub mod http;
pub mod outline;
pub mod resolver;
pub mod search;

pub use completion::{GeminiClient, TextCompletion};
pub use fetch::{FetchedImage, HttpImageFetcher, ImageFetch};
pub use outline::OutlineGenerator;
pub use resolver::{build_query, ImageResolver};
pub use search::{CustomSearchClient, ImageSearch};
