//! # nano-image
//!
//! A small image utility: open an image, resize or blur it, and save it in
//! another format under a chosen naming policy. Its core is a byte-exact
//! encoder for uncompressed 24-bit BMP files; every other format goes through
//! the `image` crate.
//!
//! # Pipeline
//!
//! ```text
//! open / load    file or bytes → ImageSession   (decode, read EXIF)
//! transform      resize, blur, EXIF edits      (each returns a new session)
//! export         session → file                (encoder, naming policy, EXIF)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`bmp`] | 24-bit BMP encoder with quality-driven downscaling |
//! | [`session`] | Immutable image session: open, resize, blur, encode |
//! | [`export`] | Save/replace with encoder dispatch and directory creation |
//! | [`naming`] | Output naming policies (replace, thumbnail, timestamp) |
//! | [`imaging`] | Backend trait, `image`-crate backend, resize math, EXIF |
//! | [`config`] | TOML config loading, validation, and merging |
//! | [`types`] | Shared value types (`Dimensions`, `ImageFormat`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Own BMP Encoder
//!
//! BMP output is written by [`bmp`] rather than the `image` crate's encoder
//! because the byte layout is fixed down to each header field, including
//! a row order and padding rule that standard encoders do not produce. The
//! [`bmp`] module docs describe the layout and where it diverges from what
//! common readers expect.
//!
//! ## Backend Trait
//!
//! Decoding, resampling, blurring and non-BMP encoding sit behind
//! [`imaging::RasterBackend`]. [`imaging::RustBackend`] is the production
//! implementation; tests use a recording mock so session and export logic can
//! be exercised without real codecs.
//!
//! ## Immutable Sessions
//!
//! An [`session::ImageSession`] never changes in place. Each transform returns
//! a new value, so a session can be cloned to render several outputs from one
//! decode.

pub mod bmp;
pub mod config;
pub mod export;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
