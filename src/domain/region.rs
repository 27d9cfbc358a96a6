//! Indian state and union-territory codes accepted in shipping addresses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed enumeration of shipping regions: the 28 states and 8 union
/// territories. Addresses outside this set are rejected at validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegionCode {
    Ap,
    Ar,
    As,
    Br,
    Ct,
    Ga,
    Gj,
    Hr,
    Hp,
    Jh,
    Ka,
    Kl,
    Mp,
    Mh,
    Mn,
    Ml,
    Mz,
    Nl,
    Or,
    Pb,
    Rj,
    Sk,
    Tn,
    Tg,
    Tr,
    Up,
    Ut,
    Wb,
    An,
    Ch,
    Dn,
    Dl,
    Jk,
    La,
    Ld,
    Py,
}

impl RegionCode {
    pub const ALL: [RegionCode; 36] = [
        Self::Ap,
        Self::Ar,
        Self::As,
        Self::Br,
        Self::Ct,
        Self::Ga,
        Self::Gj,
        Self::Hr,
        Self::Hp,
        Self::Jh,
        Self::Ka,
        Self::Kl,
        Self::Mp,
        Self::Mh,
        Self::Mn,
        Self::Ml,
        Self::Mz,
        Self::Nl,
        Self::Or,
        Self::Pb,
        Self::Rj,
        Self::Sk,
        Self::Tn,
        Self::Tg,
        Self::Tr,
        Self::Up,
        Self::Ut,
        Self::Wb,
        Self::An,
        Self::Ch,
        Self::Dn,
        Self::Dl,
        Self::Jk,
        Self::La,
        Self::Ld,
        Self::Py,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Ap => "AP",
            Self::Ar => "AR",
            Self::As => "AS",
            Self::Br => "BR",
            Self::Ct => "CT",
            Self::Ga => "GA",
            Self::Gj => "GJ",
            Self::Hr => "HR",
            Self::Hp => "HP",
            Self::Jh => "JH",
            Self::Ka => "KA",
            Self::Kl => "KL",
            Self::Mp => "MP",
            Self::Mh => "MH",
            Self::Mn => "MN",
            Self::Ml => "ML",
            Self::Mz => "MZ",
            Self::Nl => "NL",
            Self::Or => "OR",
            Self::Pb => "PB",
            Self::Rj => "RJ",
            Self::Sk => "SK",
            Self::Tn => "TN",
            Self::Tg => "TG",
            Self::Tr => "TR",
            Self::Up => "UP",
            Self::Ut => "UT",
            Self::Wb => "WB",
            Self::An => "AN",
            Self::Ch => "CH",
            Self::Dn => "DN",
            Self::Dl => "DL",
            Self::Jk => "JK",
            Self::La => "LA",
            Self::Ld => "LD",
            Self::Py => "PY",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ap => "Andhra Pradesh",
            Self::Ar => "Arunachal Pradesh",
            Self::As => "Assam",
            Self::Br => "Bihar",
            Self::Ct => "Chhattisgarh",
            Self::Ga => "Goa",
            Self::Gj => "Gujarat",
            Self::Hr => "Haryana",
            Self::Hp => "Himachal Pradesh",
            Self::Jh => "Jharkhand",
            Self::Ka => "Karnataka",
            Self::Kl => "Kerala",
            Self::Mp => "Madhya Pradesh",
            Self::Mh => "Maharashtra",
            Self::Mn => "Manipur",
            Self::Ml => "Meghalaya",
            Self::Mz => "Mizoram",
            Self::Nl => "Nagaland",
            Self::Or => "Odisha",
            Self::Pb => "Punjab",
            Self::Rj => "Rajasthan",
            Self::Sk => "Sikkim",
            Self::Tn => "Tamil Nadu",
            Self::Tg => "Telangana",
            Self::Tr => "Tripura",
            Self::Up => "Uttar Pradesh",
            Self::Ut => "Uttarakhand",
            Self::Wb => "West Bengal",
            Self::An => "Andaman and Nicobar Islands",
            Self::Ch => "Chandigarh",
            Self::Dn => "Dadra and Nagar Haveli and Daman and Diu",
            Self::Dl => "Delhi",
            Self::Jk => "Jammu and Kashmir",
            Self::La => "Ladakh",
            Self::Ld => "Lakshadweep",
            Self::Py => "Puducherry",
        }
    }
}

impl FromStr for RegionCode {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.code() == code)
            .ok_or_else(|| UnknownRegion(s.trim().to_string()))
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown region code: {0}")]
pub struct UnknownRegion(pub String);
