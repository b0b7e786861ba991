mod client;

pub use client::{
    CreatedFile, DriveClient, DriveError, ErrorClass, FOLDER_MIME_TYPE, FileUpload, ROOT_FOLDER_ID,
};
pub use reqwest::StatusCode;
