// HTTP status codes set by the dispatcher and its handlers

/// Named statuses for `WebResponse::set_status`; any other code goes
/// through `set_status_code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,
    Created = 201,
    NoContent = 204,
    BadRequest = 400,
    NotFound = 404,
    InternalServerError = 500,
}

impl HttpStatus {
    pub fn code(&self) -> u16 {
        *self as u16
    }
}
