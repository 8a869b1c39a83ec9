use sbox_derive::sbox_error;

#[sbox_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        source: std::io::Error,
        context: String,
    },
}

fn main() {}
