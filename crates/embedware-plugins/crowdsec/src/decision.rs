use std::fmt;
use std::net::IpAddr;

use embedware_core::IpRangeSet;
use embedware_core::net::InvalidIpRange;

/// Remediation applied to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remediation {
    Ban,
    Captcha,
}

impl Remediation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ban => "ban",
            Self::Captcha => "captcha",
        }
    }
}

impl fmt::Display for Remediation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static decision list. A ban outranks a captcha for the same address.
#[derive(Debug, Clone, Default)]
pub struct Decisions {
    banned: IpRangeSet,
    captcha: IpRangeSet,
}

impl Decisions {
    pub fn new<S: AsRef<str>>(banned: &[S], captcha: &[S]) -> Result<Self, InvalidIpRange> {
        Ok(Self {
            banned: IpRangeSet::parse(banned)?,
            captcha: IpRangeSet::parse(captcha)?,
        })
    }

    pub fn lookup(&self, ip: IpAddr) -> Option<Remediation> {
        if self.banned.contains(ip) {
            Some(Remediation::Ban)
        } else if self.captcha.contains(ip) {
            Some(Remediation::Captcha)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.banned.len() + self.captcha.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
