use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Aqara open API data centres. Each one is a separate host; accounts only
/// exist in the region they were registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    China,
    Usa,
    SouthKorea,
    Russia,
    #[default]
    Europe,
    Singapore,
}

impl Region {
    pub const ALL: [Region; 6] = [
        Region::China,
        Region::Usa,
        Region::SouthKorea,
        Region::Russia,
        Region::Europe,
        Region::Singapore,
    ];

    pub fn host(&self) -> &'static str {
        match self {
            Region::China => "open-cn.aqara.com",
            Region::Usa => "open-usa.aqara.com",
            Region::SouthKorea => "open-kr.aqara.com",
            Region::Russia => "open-ru.aqara.com",
            Region::Europe => "open-ger.aqara.com",
            Region::Singapore => "open-sg.aqara.com",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Region::China => "china",
            Region::Usa => "usa",
            Region::SouthKorea => "south-korea",
            Region::Russia => "russia",
            Region::Europe => "europe",
            Region::Singapore => "singapore",
        }
    }

    pub fn base_url(&self) -> String {
        format!("https://{}", self.host())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Region {
    type Err = String;

    /// Accepts either the region name (`europe`, `south-korea`, ...) or its hostname.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Region::ALL
            .into_iter()
            .find(|region| region.name() == wanted || region.host() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Region::ALL.iter().map(|r| r.name()).collect();
                format!("unknown region '{}', expected one of: {}", s, names.join(", "))
            })
    }
}
