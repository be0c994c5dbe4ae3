//! Catalog of server operations.

use std::fmt;

/// A fixed-path server operation.
///
/// The full URL is the configured base URL followed by [`path`](Self::path);
/// nothing is inserted between them, so the base must end in `/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    IdentifyUser,
    SendSms,
    Families,
    ProductsByFamily,
    ProductByPartName,
    UserDetails,
    UpdateUser,
    DrinkTypes,
    CapsuleTypes,
    MachineTypes,
    GiftByCapsuleType,
    OpenOrder,
    OrderHistory,
    OrderDetails,
    Packs,
    PackInfo,
    Banners,
    CitiesBySubstring,
    StreetsBySubstringAndCity,
}

impl Endpoint {
    /// Every endpoint in the catalog.
    pub const ALL: [Endpoint; 19] = [
        Endpoint::IdentifyUser,
        Endpoint::SendSms,
        Endpoint::Families,
        Endpoint::ProductsByFamily,
        Endpoint::ProductByPartName,
        Endpoint::UserDetails,
        Endpoint::UpdateUser,
        Endpoint::DrinkTypes,
        Endpoint::CapsuleTypes,
        Endpoint::MachineTypes,
        Endpoint::GiftByCapsuleType,
        Endpoint::OpenOrder,
        Endpoint::OrderHistory,
        Endpoint::OrderDetails,
        Endpoint::Packs,
        Endpoint::PackInfo,
        Endpoint::Banners,
        Endpoint::CitiesBySubstring,
        Endpoint::StreetsBySubstringAndCity,
    ];

    pub const fn path(self) -> &'static str {
        match self {
            Endpoint::IdentifyUser => "identifyuser",
            Endpoint::SendSms => "sendsms",
            Endpoint::Families => "families",
            Endpoint::ProductsByFamily => "familyproducts",
            Endpoint::ProductByPartName => "product",
            Endpoint::UserDetails => "userdetails",
            Endpoint::UpdateUser => "updateuser",
            Endpoint::DrinkTypes => "drinktypes",
            // The server really spells it this way.
            Endpoint::CapsuleTypes => "cpasuletypes",
            Endpoint::MachineTypes => "machines",
            Endpoint::GiftByCapsuleType => "gift",
            Endpoint::OpenOrder => "openorder",
            Endpoint::OrderHistory => "orders",
            Endpoint::OrderDetails => "orderinfo",
            Endpoint::Packs => "packs",
            Endpoint::PackInfo => "pack",
            Endpoint::Banners => "banners",
            Endpoint::CitiesBySubstring => "cities",
            Endpoint::StreetsBySubstringAndCity => "street",
        }
    }

    /// `base` followed by the operation path. No validation is done.
    pub fn url(self, base: &str) -> String {
        let path = self.path();
        let mut url = String::with_capacity(base.len() + path.len());
        url.push_str(base);
        url.push_str(path);
        url
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
