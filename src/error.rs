use std::{io, num::ParseIntError, path::PathBuf};

use thiserror::Error;

use crate::topology::Asn;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("AS{asn} is already registered")]
    DuplicateKey { asn: Asn },

    #[error("index {index} is already taken by AS{asn}")]
    IndexTaken { index: usize, asn: Asn },

    #[error("index {index} cannot be registered")]
    IndexOutOfRange { index: usize },

    #[error("AS{asn} is not registered")]
    NotFound { asn: Asn },

    #[error("line {line} is not in `<asn> <index>` format: {content:?}")]
    MalformedInput { line: usize, content: String },

    #[error("registry stream is not writable")]
    NoWritePermission,

    #[error("registry stream is not readable")]
    NoReadPermission,

    #[error(transparent)]
    Io(io::Error),
}

impl RegistryError {
    pub(crate) fn from_write(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => RegistryError::NoWritePermission,
            _ => RegistryError::Io(err),
        }
    }

    pub(crate) fn from_read(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => RegistryError::NoReadPermission,
            _ => RegistryError::Io(err),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VisitedError {
    #[error("vertex {0} is already in the visited set")]
    AlreadyPresent(usize),

    #[error("vertex {0} is not in the visited set")]
    NotFound(usize),
}

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error(transparent)]
    IoError(#[from] io::Error),

    #[error("line {line}: invalid AS number or relationship: {source}")]
    ParseAsnError { line: usize, source: ParseIntError },

    #[error("line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("AS{0} is not part of the topology")]
    UnknownAsn(Asn),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis needs at least one worker thread")]
    NoThreads,

    #[error("vertex {vertex} is out of range, topology has {count} vertices")]
    VertexOutOfRange { vertex: usize, count: usize },

    #[error("cannot build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Failure of a single analysis worker. Other workers keep running.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("cannot create {}: {source}", path.display())]
    Create { path: PathBuf, source: io::Error },

    #[error("cannot write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}
