#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("graph link {link} references missing node {index} (graph has {len} nodes)")]
    DanglingLink {
        link: usize,
        index: usize,
        len: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
