use std::{fmt, io};
use std::panic::Location;
use std::error::Error as StdError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A chain of error details, most recent first.
///
/// Each detail is a message plus an optional list of `(key, value)` context
/// lines. Errors can be chained onto one another with [`Error::chain()`] or
/// the [`Chainable`] extension trait, producing an indented report when
/// displayed.
#[derive(Debug)]
pub struct Error {
    detail: Vec<Box<dyn ErrorDetail>>,
    prev: Option<Box<Error>>,
    location: &'static Location<'static>,
}

pub trait ErrorDetail: fmt::Display + fmt::Debug + Send + Sync {
    fn context(&self) -> Vec<(Option<String>, String)> { vec![] }
}

impl Error {
    #[track_caller]
    pub fn from_std<E>(error: E) -> Self
        where E: StdError + Send + Sync + 'static
    {
        Error::from(Box::new(error) as Box<dyn StdError + Send + Sync>)
    }

    /// Places `self` behind `other`: `other` becomes the headline, `self` the
    /// underlying cause.
    pub fn chain(self, mut other: Error) -> Self {
        fn attach(error: Error, behind: &mut Error) {
            match behind.prev.as_mut() {
                Some(prev) => attach(error, prev),
                None => behind.prev = Some(Box::new(error)),
            }
        }

        attach(self, &mut other);
        other
    }

    /// The headline message of this error.
    pub fn message(&self) -> String {
        self.detail.first()
            .map(|d| d.to_string())
            .unwrap_or_default()
    }

    /// Returns `true` if this error or any error it was chained onto carries
    /// a detail whose message contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.detail.iter().any(|d| d.to_string().contains(needle))
            || self.prev.as_ref().map_or(false, |p| p.mentions(needle))
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl ErrorDetail for &(dyn StdError + Send + Sync) {
    fn context(&self) -> Vec<(Option<String>, String)> {
        std::iter::successors(self.source(), |&e| e.source())
            .map(|e| (None, e.to_string()))
            .collect()
    }
}

impl ErrorDetail for Box<dyn StdError + Send + Sync> {
    fn context(&self) -> Vec<(Option<String>, String)> {
        let error: &(dyn StdError + Send + Sync) = &**self;
        error.context()
    }
}

macro_rules! impl_error_detail_with_std_error {
    ($($T:ty),* $(,)?) => {
        $(
            impl $crate::error::ErrorDetail for $T {
                fn context(&self) -> Vec<(Option<String>, String)> {
                    let error: &(dyn std::error::Error + Send + Sync) = self;
                    error.context()
                }
            }
        )*
    }
}

impl_error_detail_with_std_error! {
    io::Error,
    toml::de::Error,
    serde_json::Error,
    serde_yaml::Error,
    minijinja::Error,
    walkdir::Error,
    std::string::FromUtf8Error,
}

impl ErrorDetail for String { }
impl ErrorDetail for &'static str { }

impl<T: ErrorDetail + 'static> From<T> for Error {
    #[track_caller]
    fn from(detail: T) -> Self {
        Error {
            detail: vec![Box::new(detail)],
            prev: None,
            location: Location::caller(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_nested(f: &mut fmt::Formatter<'_>, e: &Error, depth: usize) -> fmt::Result {
            let indent = " ".repeat(depth * 4);
            let newline = format!("\n{indent}");
            for detail in &e.detail {
                writeln!(f, "{indent}{}", detail.to_string().replace('\n', &newline))?;
                for (key, value) in detail.context() {
                    let value = value.replace('\n', &newline);
                    match key {
                        Some(key) => writeln!(f, "{indent}{key}: {value}")?,
                        None => writeln!(f, "{indent}{value}")?,
                    }
                }

                if std::env::var_os("RUST_BACKTRACE").is_some() {
                    writeln!(f, "{indent}[{}]", e.location)?;
                }
            }

            match &e.prev {
                Some(prev) => write_nested(f, prev, depth + 1),
                None => Ok(()),
            }
        }

        write_nested(f, self, 0)
    }
}

/// An error detail built from a message and context parameters. This is what
/// the [`error!`] macro produces.
#[derive(Debug)]
pub struct MakeshiftError {
    pub message: String,
    pub parameters: Vec<(Option<String>, String)>,
}

impl fmt::Display for MakeshiftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl ErrorDetail for MakeshiftError {
    fn context(&self) -> Vec<(Option<String>, String)> {
        self.parameters.clone()
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! err {
    ($($token:tt)*) => (Err($crate::error!($($token)*)));
}

/// Builds an [`Error`](crate::error::Error) from a message followed by
/// context parameters, each either `value` or `key => value`.
///
/// ```rust
/// let e = sitegen::error!("failed to copy asset", "source" => "a.png", "cross-device");
/// assert_eq!(e.message(), "failed to copy asset");
/// ```
#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($msg:expr, $($rest:tt)*) => (
        $crate::error::Error::from($crate::error::MakeshiftError {
            message: $msg.to_string(),
            parameters: {
                #[allow(unused_mut)]
                let mut v: Vec<(Option<String>, String)> = Vec::new();
                $crate::error!(@param v $($rest)*);
                v
            },
        })
    );

    ($msg:expr) => ( $crate::error!($msg,) );

    (@param $v:ident $key:expr => $value:expr, $($rest:tt)*) => {
        $crate::error!(@param $v $key => $value);
        $crate::error!(@param $v $($rest)*);
    };

    (@param $v:ident $key:expr => $value:expr) => {
        $v.push((Some($key.to_string()), $value.to_string()));
    };

    (@param $v:ident $value:expr, $($rest:tt)*) => {
        $crate::error!(@param $v $value);
        $crate::error!(@param $v $($rest)*);
    };

    (@param $v:ident $value:expr) => {
        $v.push((None, $value.to_string()));
    };

    (@param $v:ident $(,)?) => { };
}

pub trait Chainable<T> {
    fn chain(self, other: impl Into<Error>) -> Result<T>;

    fn chain_with<F, E>(self, f: F) -> Result<T>
        where F: FnOnce() -> E, E: Into<Error>;
}

impl<T, E: Into<Error>> Chainable<T> for Result<T, E> {
    #[track_caller]
    fn chain(self, other: impl Into<Error>) -> Result<T> {
        self.map_err(|e| Into::<Error>::into(e).chain(other.into()))
    }

    #[track_caller]
    fn chain_with<F, Err>(self, f: F) -> Result<T>
        where F: FnOnce() -> Err, Err: Into<Error>,
    {
        self.map_err(|e| Into::<Error>::into(e).chain(f().into()))
    }
}
