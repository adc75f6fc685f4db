pub mod codec;
pub mod search;

pub use codec::{Codec, EncodeRequest, Encoded, Filter, ImageCodec, Resize};
pub use search::{AdaptiveSearch, SearchLimits};
