use thiserror::Error;

pub type RetroResult<T> = ::std::result::Result<T, RetroError>;

#[derive(Error, Debug)]
pub enum RetroError {
    #[error("machine \"{0}\" not recognized")]
    UnknownMachine(String),
    #[error("resource \"{0}\" not found")]
    UnknownResource(String),
    #[error("region \"{0}\" overlaps an active region")]
    RegionOverlap(String),
    #[error("cartridge type {0:#04x} is not supported")]
    UnsupportedCartType(u8),
    #[error("bad cartridge image: {0}")]
    BadCartImage(String),
    #[error("no boot ROM configured for this machine")]
    MissingBootRom,
    #[error("clock rate must be non-zero")]
    ZeroClockRate,
    #[error("master clock rate overflow: LCM of registered rates exceeds 32 bits")]
    MasterRateOverflow,
    #[error("cannot map {len} bytes at offset {offset} of \"{path}\"")]
    BadMapWindow {
        path: String,
        offset: u64,
        len: usize,
    },
    #[error("file or directory not found: {0}")]
    FileOrDirNotFound(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
