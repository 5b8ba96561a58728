use super::{candidate_parse_error::CandidateParseError, candidate_type::CandidateType};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Type preferences (RFC 8445 §5.1.2.2 recommended values).
const HOST_TYPE_PREF: u32 = 126;
const PEER_REFLEXIVE_TYPE_PREF: u32 = 110;
const SERVER_REFLEXIVE_TYPE_PREF: u32 = 100;
const RELAYED_TYPE_PREF: u32 = 0;

const MAX_LOCAL_PREF: u16 = u16::MAX;

/// Offsets used in the priority calculation -> RFC 8445 §5.1.2.1
const TYPE_PREF_SHIFT: u32 = 24;
const LOCAL_PREF_SHIFT: u32 = 8;
const COMPONENT_OFFSET: u32 = 256;

const ATTR_PREFIX: &str = "a=";
const CANDIDATE_PREFIX: &str = "candidate:";
const MANDATORY_TOKENS: usize = 8;

/// A connectivity candidate as reported by the ICE agent.
///
/// Every field is passed through as the agent produced it; equality over all
/// fields is the candidate's identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    /// Groups candidates sharing type, base and server.
    pub foundation: String,
    /// 1 = RTP, 2 = RTCP.
    pub component: u16,
    /// Transport token, e.g. `udp` or `tcp`.
    pub protocol: String,
    pub priority: u32,
    /// IP literal or mDNS hostname.
    pub address: String,
    pub port: u16,
    pub cand_type: CandidateType,
    /// Base address of a reflexive or relayed candidate.
    pub related_address: Option<String>,
    pub related_port: Option<u16>,
    /// ICE username fragment of the description this candidate belongs to.
    pub ufrag: Option<String>,
    /// Remaining `key value` pairs (`generation`, `network-id`, ...) in order.
    pub extensions: Vec<(String, String)>,
}

impl Candidate {
    /// Host candidate with RFC 8445 priority and a hashed foundation.
    #[must_use]
    pub fn host(address: &str, port: u16, protocol: &str, component: u16, ufrag: Option<String>) -> Self {
        let protocol = protocol.to_ascii_lowercase();
        Self {
            foundation: Self::calculate_foundation(CandidateType::Host, &protocol, address),
            component,
            priority: Self::calculate_priority(CandidateType::Host, MAX_LOCAL_PREF, component),
            protocol,
            address: address.to_owned(),
            port,
            cand_type: CandidateType::Host,
            related_address: None,
            related_port: None,
            ufrag,
            extensions: Vec::new(),
        }
    }

    // RFC 8445 §5.1.1.3: any stable identifier works as a foundation
    fn calculate_foundation(cand_type: CandidateType, transport_lc: &str, base_ip: &str) -> String {
        let mut hasher = DefaultHasher::new();
        format!("{cand_type}-{transport_lc}-{base_ip}").hash(&mut hasher);
        format!("{}", hasher.finish() & u64::from(u32::MAX))
    }

    // RFC 8445 §5.1.2.1: 32-bit candidate priority
    const fn calculate_priority(cand_type: CandidateType, local_pref: u16, component_id: u16) -> u32 {
        let type_pref = match cand_type {
            CandidateType::Host => HOST_TYPE_PREF,
            CandidateType::ServerReflexive => SERVER_REFLEXIVE_TYPE_PREF,
            CandidateType::PeerReflexive => PEER_REFLEXIVE_TYPE_PREF,
            CandidateType::Relayed => RELAYED_TYPE_PREF,
        };

        (type_pref << TYPE_PREF_SHIFT)
            | ((local_pref as u32) << LOCAL_PREF_SHIFT)
            | (COMPONENT_OFFSET.saturating_sub(component_id as u32))
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{CANDIDATE_PREFIX}{} {} {} {} {} {} typ {}",
            self.foundation,
            self.component,
            self.protocol,
            self.priority,
            self.address,
            self.port,
            self.cand_type,
        )?;
        if let Some(raddr) = &self.related_address {
            write!(f, " raddr {raddr}")?;
        }
        if let Some(rport) = self.related_port {
            write!(f, " rport {rport}")?;
        }
        for (k, v) in &self.extensions {
            write!(f, " {k} {v}")?;
        }
        if let Some(ufrag) = &self.ufrag {
            write!(f, " ufrag {ufrag}")?;
        }
        Ok(())
    }
}

impl FromStr for Candidate {
    type Err = CandidateParseError;

    /// Reads the RFC 8839 `candidate` attribute, with or without the
    /// `a=` and `candidate:` prefixes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix(ATTR_PREFIX).unwrap_or(s);
        let s = s.strip_prefix(CANDIDATE_PREFIX).unwrap_or(s);

        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.len() < MANDATORY_TOKENS {
            return Err(CandidateParseError::TooShort(s.to_owned()));
        }

        let foundation = parts[0].to_owned();
        let component: u16 = parts[1].parse()?;
        let protocol = parts[2].to_owned();
        let priority: u32 = parts[3].parse()?;
        let address = parts[4].to_owned();
        let port: u16 = parts[5].parse()?;

        if parts[6] != "typ" {
            return Err(CandidateParseError::Missing("typ"));
        }
        let cand_type = CandidateType::from_sdp_str(parts[7])
            .ok_or_else(|| CandidateParseError::UnknownType(parts[7].to_owned()))?;

        let mut candidate = Candidate {
            foundation,
            component,
            protocol,
            priority,
            address,
            port,
            cand_type,
            related_address: None,
            related_port: None,
            ufrag: None,
            extensions: Vec::new(),
        };

        for pair in parts[MANDATORY_TOKENS..].chunks(2) {
            let [key, value] = pair else {
                return Err(CandidateParseError::Invalid("extension without value"));
            };
            match *key {
                "raddr" => candidate.related_address = Some((*value).to_owned()),
                "rport" => candidate.related_port = Some(value.parse()?),
                "ufrag" => candidate.ufrag = Some((*value).to_owned()),
                _ => candidate
                    .extensions
                    .push(((*key).to_owned(), (*value).to_owned())),
            }
        }

        Ok(candidate)
    }
}

#[cfg(test)]
mod test {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    const CHROME_HOST: &str = "candidate:842163049 1 udp 1677729535 192.168.1.20 54400 typ host generation 0 ufrag yxYb network-id 1";
    const CHROME_SRFLX: &str = "candidate:3098175849 1 udp 1686052607 203.0.113.7 61000 typ srflx raddr 192.168.1.20 rport 54400 generation 0 ufrag yxYb";

    #[test]
    fn parses_host_candidate_with_extensions() {
        let c: Candidate = CHROME_HOST.parse().unwrap();
        assert_eq!(c.foundation, "842163049");
        assert_eq!(c.component, 1);
        assert_eq!(c.protocol, "udp");
        assert_eq!(c.priority, 1_677_729_535);
        assert_eq!(c.address, "192.168.1.20");
        assert_eq!(c.port, 54400);
        assert_eq!(c.cand_type, CandidateType::Host);
        assert_eq!(c.ufrag.as_deref(), Some("yxYb"));
        assert_eq!(
            c.extensions,
            vec![
                ("generation".to_owned(), "0".to_owned()),
                ("network-id".to_owned(), "1".to_owned())
            ]
        );
    }

    #[test]
    fn parses_reflexive_related_address() {
        let c: Candidate = CHROME_SRFLX.parse().unwrap();
        assert_eq!(c.cand_type, CandidateType::ServerReflexive);
        assert_eq!(c.related_address.as_deref(), Some("192.168.1.20"));
        assert_eq!(c.related_port, Some(54400));
    }

    #[test]
    fn display_output_parses_back_to_equal_candidate() {
        let c: Candidate = CHROME_SRFLX.parse().unwrap();
        let rendered = c.to_string();
        assert!(rendered.starts_with("candidate:3098175849 1 udp"));
        assert_eq!(rendered.parse::<Candidate>().unwrap(), c);
    }

    #[test]
    fn mdns_hostname_is_kept_verbatim() {
        let c: Candidate = "a=candidate:1 1 UDP 2122252543 4f1c7a.local 50000 typ host"
            .parse()
            .unwrap();
        assert_eq!(c.address, "4f1c7a.local");
        assert_eq!(c.protocol, "UDP");
    }

    #[test]
    fn rejects_short_or_unknown_type() {
        assert!(matches!(
            "candidate:1 1 udp 5 10.0.0.1".parse::<Candidate>(),
            Err(CandidateParseError::TooShort(_))
        ));
        assert!(matches!(
            "candidate:1 1 udp 5 10.0.0.1 9 typ bogus".parse::<Candidate>(),
            Err(CandidateParseError::UnknownType(t)) if t == "bogus"
        ));
        assert!(matches!(
            "candidate:1 1 udp 5 10.0.0.1 9 kind host".parse::<Candidate>(),
            Err(CandidateParseError::Missing("typ"))
        ));
        assert!(matches!(
            "candidate:1 1 udp x 10.0.0.1 9 typ host".parse::<Candidate>(),
            Err(CandidateParseError::ParseInt(_))
        ));
    }

    #[test]
    fn host_priority_beats_relay_priority() {
        let host_p = Candidate::calculate_priority(CandidateType::Host, MAX_LOCAL_PREF, 1);
        let relay_p = Candidate::calculate_priority(CandidateType::Relayed, MAX_LOCAL_PREF, 1);
        assert!(host_p > relay_p);
        let c = Candidate::host("10.0.0.5", 4000, "UDP", 1, None);
        assert_eq!(c.priority, host_p);
        assert_eq!(c.protocol, "udp");
    }

    #[test]
    fn foundation_depends_on_base_address() {
        let f1 = Candidate::calculate_foundation(CandidateType::Host, "udp", "192.168.0.10");
        let f2 = Candidate::calculate_foundation(CandidateType::Host, "udp", "192.168.0.11");
        assert_ne!(f1, f2);
    }
}
