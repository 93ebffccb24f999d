//! Guest-side plumbing for the CGI probes: the request as the server passed
//! it in, form decoding, upload storage and the response header block.

pub mod config;
pub mod error;
pub mod form;
pub mod logging;
pub mod request;
pub mod response;
pub mod upload;

pub use {
    config::ProbeConfig,
    error::{Result, SdkError},
    form::{FormData, FormField},
    request::CgiRequest,
    response::{write_header, ContentType},
    upload::{basename, save_upload},
};
