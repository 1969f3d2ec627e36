/// Declares a closed enumeration stored and serialized in
/// `SCREAMING_SNAKE_CASE`, together with its [`crate::normalize::CatalogEnum`]
/// impl. Variants are listed lowest ordinal first; each may carry a list of
/// alias spellings (already in upper-snake form).
macro_rules! catalog_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $field:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident $( = [ $( $alias:literal ),* $(,)? ] )?
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
            ::strum_macros::Display,
            ::strum_macros::EnumString,
            ::strum_macros::AsRefStr,
            ::strum_macros::IntoStaticStr,
        )]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        #[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $crate::normalize::CatalogEnum for $name {
            const FIELD: &'static str = $field;
            const ALL: &'static [Self] = &[$(Self::$variant),+];
            const ALIASES: &'static [(&'static str, Self)] = &[
                $( $( $( ($alias, Self::$variant), )* )? )+
            ];
        }
    };
}
