use retro_lib::RetroError;
use thiserror::Error;

pub type Result<T> = ::std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("emulation core error: {0}")]
    Core(#[from] RetroError),
}
