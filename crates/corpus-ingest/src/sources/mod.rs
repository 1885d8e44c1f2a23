//! Source resolution: paths, globs, archives and URLs to concrete sources

mod archive;
mod expander;
mod remote;

pub use archive::unpack;
pub use expander::{ExpandOptions, ExpandedSources, SourceExpander};
pub use remote::{content_type_extension, Fetched, RemoteFetcher};
