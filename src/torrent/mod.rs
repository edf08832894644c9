//! Torrent descriptor generation

pub mod bencode;
pub mod encoder;
pub mod packager;

pub use encoder::{EncodedTorrent, TorrentEncoder, V1TorrentEncoder};
pub use packager::{
    CollisionDecision, CollisionResolver, FixedPolicy, PackagingReport, PromptResolver, TorrentPackager,
};
