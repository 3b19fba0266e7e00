use super::*;
use crate::bitmap::ParseBitmapError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroQuantum {
        id: usize,
    },
    ZeroPacketSize {
        id: usize,
    },
    CapBelowPacketSize {
        id: usize,
        cap: Credit,
        packet_size: Credit,
    },
    LengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    Parse {
        field: &'static str,
        value: String,
    },
    Bitmap(ParseBitmapError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroQuantum { id } => write!(f, "requester {}: quantum must be > 0", id),
            ConfigError::ZeroPacketSize { id } => {
                write!(f, "requester {}: packet size must be > 0", id)
            }
            ConfigError::CapBelowPacketSize {
                id,
                cap,
                packet_size,
            } => write!(
                f,
                "requester {}: deficit cap {} is below packet size {}",
                id, cap, packet_size
            ),
            ConfigError::LengthMismatch {
                field,
                expected,
                found,
            } => write!(f, "{}: expect {} values, found {}", field, expected, found),
            ConfigError::Parse { field, value } => {
                write!(f, "{}: '{}' is not an unsigned integer", field, value)
            }
            ConfigError::Bitmap(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Bitmap(e) => Some(e),
            _ => None,
        }
    }
}

impl std::convert::From<ParseBitmapError> for ConfigError {
    fn from(e: ParseBitmapError) -> Self {
        ConfigError::Bitmap(e)
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Static per-requester parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Requester {
    pub quantum: Credit,
    pub packet_size: Credit,
    pub deficit_cap: Credit,
}

/// Validated arbiter configuration. Immutable once built.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DrrConfig<const N: usize> {
    reqs: [Requester; N],
}

impl<const N: usize> DrrConfig<N> {
    pub fn new(
        quantum: [Credit; N],
        packet_size: [Credit; N],
        deficit_cap: [Credit; N],
    ) -> Result<Self> {
        for id in 0..N {
            if quantum[id] == 0 {
                return Err(ConfigError::ZeroQuantum { id });
            }
            if packet_size[id] == 0 {
                return Err(ConfigError::ZeroPacketSize { id });
            }
            if deficit_cap[id] < packet_size[id] {
                return Err(ConfigError::CapBelowPacketSize {
                    id,
                    cap: deficit_cap[id],
                    packet_size: packet_size[id],
                });
            }
        }
        Ok(DrrConfig {
            reqs: array_init::array_init(|i| Requester {
                quantum: quantum[i],
                packet_size: packet_size[i],
                deficit_cap: deficit_cap[i],
            }),
        })
    }

    /// Comma separated lists, one value per requester, e.g. `"600,600,600,300"`.
    pub fn from_lists(quantum: &str, packet_size: &str, deficit_cap: &str) -> Result<Self> {
        Self::new(
            parse_lanes("quantum", quantum)?,
            parse_lanes("packet_size", packet_size)?,
            parse_lanes("deficit_cap", deficit_cap)?,
        )
    }

    pub fn requester(&self, id: usize) -> &Requester {
        &self.reqs[id]
    }

    pub fn requesters(&self) -> impl Iterator<Item = &Requester> {
        self.reqs.iter()
    }
}

impl DrrConfig<REQS> {
    pub fn reference() -> Self {
        DrrConfig {
            reqs: array_init::array_init(|i| Requester {
                quantum: REF_QUANTUM[i],
                packet_size: REF_PACKET_SIZE[i],
                deficit_cap: REF_DEFICIT_CAP[i],
            }),
        }
    }
}

fn parse_lanes<const N: usize>(field: &'static str, raw: &str) -> Result<[Credit; N]> {
    let values = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Credit>().map_err(|_| ConfigError::Parse {
                field,
                value: s.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    if values.len() != N {
        return Err(ConfigError::LengthMismatch {
            field,
            expected: N,
            found: values.len(),
        });
    }
    Ok(array_init::array_init(|i| values[i]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_test() {
        let cfg = DrrConfig::reference();
        assert_eq!(
            cfg,
            DrrConfig::new(REF_QUANTUM, REF_PACKET_SIZE, REF_DEFICIT_CAP).unwrap()
        );
        assert_eq!(
            *cfg.requester(2),
            Requester {
                quantum: 600,
                packet_size: 900,
                deficit_cap: 1200
            }
        );
        assert_eq!(cfg.requesters().count(), REQS);
    }

    #[test]
    fn invalid_cfg_test() {
        assert_eq!(
            DrrConfig::new([1, 0], [1, 1], [1, 1]),
            Err(ConfigError::ZeroQuantum { id: 1 })
        );
        assert_eq!(
            DrrConfig::new([1, 1], [0, 1], [1, 1]),
            Err(ConfigError::ZeroPacketSize { id: 0 })
        );
        assert_eq!(
            DrrConfig::new([1, 1], [5, 1], [4, 1]),
            Err(ConfigError::CapBelowPacketSize {
                id: 0,
                cap: 4,
                packet_size: 5
            })
        );
        assert!(DrrConfig::new([1], [5], [5]).is_ok());
    }

    #[test]
    fn from_lists_test() {
        let cfg = DrrConfig::<REQS>::from_lists("600,600,600,300", "300, 600, 900, 300", "600,600,1200,300")
            .unwrap();
        assert_eq!(cfg, DrrConfig::reference());
        assert_eq!(
            DrrConfig::<REQS>::from_lists("600,600,600", "1,1,1,1", "1,1,1,1"),
            Err(ConfigError::LengthMismatch {
                field: "quantum",
                expected: 4,
                found: 3
            })
        );
        assert_eq!(
            DrrConfig::<REQS>::from_lists("1,1,1,1", "1,x,1,1", "1,1,1,1"),
            Err(ConfigError::Parse {
                field: "packet_size",
                value: "x".to_string()
            })
        );
        assert!(
            DrrConfig::<REQS>::from_lists("1,1,1,1", "2,2,2,2", "1,1,1,1")
                .unwrap_err()
                .to_string()
                .contains("below packet size")
        );
    }
}
