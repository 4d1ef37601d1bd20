use thiserror::Error;

use crate::codec::CodecError;
use crate::model::ScriptError;
use crate::reveal::RevealError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Reveal(#[from] RevealError),
}
