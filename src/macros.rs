//! Macros for declaring context kinds.

/// Implements [`ContextKind`](crate::ContextKind) for a type with a single macro invocation.
///
/// Three forms are supported:
///
/// - `context_kind!(Kind)`: the arguments are the value itself and construction
///   cannot fail (`Args = Kind`, `Error = Infallible`). Bind values with `Kind::bind`.
/// - `context_kind!(Kind, args = Args, construct = path)`: infallible constructor
///   `fn(Args) -> Kind`.
/// - `context_kind!(Kind, args = Args, error = Error, construct = path)`: fallible
///   constructor `fn(Args) -> Result<Kind, Error>`.
///
/// # Examples
///
/// ```rust
/// use context_local::{context_kind, ContextKind};
///
/// #[derive(Debug)]
/// struct RequestId(u64);
/// context_kind!(RequestId);
///
/// let _guard = RequestId::bind(RequestId(42));
/// assert_eq!(RequestId::current().unwrap().0, 42);
/// ```
///
/// # Named Arguments
///
/// ```rust
/// use context_local::{context_kind, ContextKind};
///
/// struct Settings {
///     verbose: bool,
///     retries: u32,
/// }
///
/// #[derive(Default)]
/// struct SettingsArgs {
///     verbose: bool,
///     retries: Option<u32>,
/// }
///
/// impl From<SettingsArgs> for Settings {
///     fn from(args: SettingsArgs) -> Self {
///         Settings {
///             verbose: args.verbose,
///             retries: args.retries.unwrap_or(3),
///         }
///     }
/// }
///
/// context_kind!(Settings, args = SettingsArgs, construct = Settings::from);
///
/// let _guard = Settings::enter(SettingsArgs { verbose: true, ..Default::default() }).unwrap();
/// assert_eq!(Settings::current().unwrap().retries, 3);
/// ```
///
/// # Fallible Construction
///
/// ```rust
/// use context_local::{context_kind, ContextKind};
///
/// struct Port(u16);
///
/// fn parse_port(raw: &'static str) -> Result<Port, std::num::ParseIntError> {
///     raw.parse().map(Port)
/// }
///
/// context_kind!(Port, args = &'static str, error = std::num::ParseIntError, construct = parse_port);
///
/// assert!(Port::enter("not a port").is_err());
/// assert!(!Port::is_bound());
/// ```
#[macro_export]
macro_rules! context_kind {
    ($kind:ty, args = $args:ty, error = $error:ty, construct = $construct:expr $(,)?) => {
        impl $crate::ContextKind for $kind {
            type Args = $args;
            type Error = $error;

            fn construct(args: Self::Args) -> ::std::result::Result<Self, Self::Error> {
                ($construct)(args)
            }
        }
    };
    ($kind:ty, args = $args:ty, construct = $construct:expr $(,)?) => {
        impl $crate::ContextKind for $kind {
            type Args = $args;
            type Error = ::std::convert::Infallible;

            fn construct(args: Self::Args) -> ::std::result::Result<Self, Self::Error> {
                ::std::result::Result::Ok(($construct)(args))
            }
        }
    };
    ($kind:ty $(,)?) => {
        impl $crate::ContextKind for $kind {
            type Args = $kind;
            type Error = ::std::convert::Infallible;

            fn construct(args: Self::Args) -> ::std::result::Result<Self, Self::Error> {
                ::std::result::Result::Ok(args)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::ContextKind;

    #[derive(Debug, PartialEq)]
    struct Plain(i32);
    context_kind!(Plain);

    struct Doubled(i32);
    context_kind!(Doubled, args = i32, construct = |n: i32| Doubled(n * 2));

    #[derive(Debug)]
    struct Checked(u8);
    context_kind!(
        Checked,
        args = i32,
        error = std::num::TryFromIntError,
        construct = |n: i32| u8::try_from(n).map(Checked),
    );

    #[test]
    fn test_plain_kind() {
        let guard = Plain::bind(Plain(5));
        assert_eq!(*guard, Plain(5));
        assert_eq!(*Plain::current().unwrap(), Plain(5));
    }

    #[test]
    fn test_infallible_constructor() {
        let _guard = Doubled::enter(21).unwrap();
        assert_eq!(Doubled::current().unwrap().0, 42);
    }

    #[test]
    fn test_fallible_constructor() {
        assert!(Checked::enter(300).is_err());
        assert!(!Checked::is_bound());

        let _guard = Checked::enter(7).unwrap();
        assert_eq!(Checked::current().unwrap().0, 7);
    }
}
