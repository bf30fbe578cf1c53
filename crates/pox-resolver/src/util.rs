//! Small helpers shared by the resolver.

/// Check if a package name represents a platform package.
///
/// Platform packages describe the runtime rather than installable code:
/// - `php` and its capability packages (`php-64bit`, `php-ipv6`, `php-zts`, `php-debug`)
/// - `ext-*` extensions and `lib-*` system libraries
/// - `composer`, `composer-runtime-api`, `composer-plugin-api`
///
/// They can satisfy requirements but never produce install operations.
///
/// # Examples
///
/// ```
/// use pox_resolver::util::is_platform_package;
///
/// assert!(is_platform_package("php"));
/// assert!(is_platform_package("ext-json"));
/// assert!(is_platform_package("lib-libxml"));
/// assert!(!is_platform_package("symfony/console"));
/// ```
pub fn is_platform_package(name: &str) -> bool {
    matches!(
        name,
        "php"
            | "php-64bit"
            | "php-ipv6"
            | "php-zts"
            | "php-debug"
            | "composer"
            | "composer-runtime-api"
            | "composer-plugin-api"
    ) || name.starts_with("ext-")
        || name.starts_with("lib-")
}
