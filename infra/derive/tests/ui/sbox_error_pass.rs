use sbox_derive::sbox_error;
use std::borrow::Cow;

#[sbox_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Rejected{}: {message}", format_context(.context))]
    Rejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn open(path: &str) -> Result<std::fs::File, DemoError> {
    std::fs::File::open(path).context("Opening fixture")
}

fn main() {
    let err = open("/definitely/not/here").unwrap_err();
    assert!(err.to_string().contains("(Opening fixture)"));

    let rejected: Result<(), DemoError> =
        Err(DemoError::Rejected { message: "bad input".into(), context: None });
    let rejected = rejected.context("validation").unwrap_err();
    assert_eq!(rejected.to_string(), "Rejected (validation): bad input");

    let internal: DemoError = "boom".into();
    assert!(matches!(internal, DemoError::Internal { .. }));
}
