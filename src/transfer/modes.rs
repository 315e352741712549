//! FTP transfer types
//!
//! Binary (`TYPE I`) is the default. ASCII (`TYPE A`) only changes how
//! listing text is encoded; file bytes are always sent unchanged.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferType {
    #[default]
    Binary,
    Ascii,
}

impl TransferType {
    /// Parse the argument of a `TYPE` command. A trailing form code such
    /// as the `N` in `A N` is ignored.
    pub fn from_type_code(arg: &str) -> Option<Self> {
        match arg.split_whitespace().next()?.to_ascii_uppercase().as_str() {
            "A" => Some(TransferType::Ascii),
            "I" => Some(TransferType::Binary),
            _ => None,
        }
    }

    pub fn is_binary(self) -> bool {
        self == TransferType::Binary
    }

    /// Name used in `150` preambles
    pub fn label(self) -> &'static str {
        match self {
            TransferType::Binary => "BINARY",
            TransferType::Ascii => "ASCII",
        }
    }
}
