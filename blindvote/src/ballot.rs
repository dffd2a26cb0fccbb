use crate::*;
use num_enum::TryFromPrimitive;
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// Identifier of a voter on the eligibility roster
pub type VoterId = u32;

/// Identifier of a candidate on the ballot
pub type CandidateId = u32;

/// Separator between fields of a cast payload
pub const FIELD_SEPARATOR: char = ';';

/// How an absent credential is written on the wire
pub const ABSENT_CREDENTIAL: &str = "None";

/// Whether a cast is a first vote or replaces an earlier one for the same mark
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CastMode {
    Initial = 1,
    Revision = 2,
}

impl fmt::Display for CastMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// The plaintext record a voter submits to the ballot box.
///
/// On the wire: `<mark>;<credential>;<candidate>;<mode>`, integers in decimal.
/// Carries no voter id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastPayload {
    pub mark: BigUint,
    pub credential: Option<BigUint>,
    pub candidate: CandidateId,
    pub mode: CastMode,
}

impl fmt::Display for CastPayload {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let sep = FIELD_SEPARATOR;
        match &self.credential {
            Some(credential) => write!(f, "{}{}{}", self.mark, sep, credential)?,
            None => write!(f, "{}{}{}", self.mark, sep, ABSENT_CREDENTIAL)?,
        }
        write!(f, "{}{}{}{}", sep, self.candidate, sep, self.mode)
    }
}

impl FromStr for CastPayload {
    type Err = Error;

    /// Parse a decrypted record.
    ///
    /// A credential field that is absent or not a number parses as `None`;
    /// the ballot box reports that as an ineligible voter.
    fn from_str(record: &str) -> Result<Self, Self::Err> {
        let mut fields = record.split(FIELD_SEPARATOR);

        let mark = required(&mut fields, "mark")?;
        let credential = required(&mut fields, "credential").ok();
        let candidate = required(&mut fields, "candidate")?;
        let mode = required(&mut fields, "mode")?;
        if fields.next().is_some() {
            return Err(PayloadDefect::TrailingFields.into());
        }

        let mark = mark
            .parse::<BigUint>()
            .map_err(|_| PayloadDefect::BadNumber("mark"))?;
        let credential = credential.and_then(|c| c.parse::<BigUint>().ok());
        let candidate = candidate
            .parse::<CandidateId>()
            .map_err(|_| PayloadDefect::BadNumber("candidate"))?;
        let mode = mode
            .parse::<u8>()
            .ok()
            .and_then(|tag| CastMode::try_from(tag).ok())
            .ok_or_else(|| PayloadDefect::BadMode(mode.to_owned()))?;

        Ok(CastPayload {
            mark,
            credential,
            candidate,
            mode,
        })
    }
}

fn required<'a, I>(fields: &mut I, name: &'static str) -> Result<&'a str, Error>
where
    I: Iterator<Item = &'a str>,
{
    match fields.next() {
        Some(field) if !field.is_empty() => Ok(field),
        _ => Err(PayloadDefect::MissingField(name).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format() {
        let payload = CastPayload {
            mark: BigUint::from(31337u32),
            credential: Some(BigUint::from(424242u32)),
            candidate: 2,
            mode: CastMode::Revision,
        };
        assert_eq!(payload.to_string(), "31337;424242;2;2");
        assert_eq!("31337;424242;2;2".parse::<CastPayload>().unwrap(), payload);

        let absent = CastPayload {
            credential: None,
            mode: CastMode::Initial,
            ..payload
        };
        assert_eq!(absent.to_string(), "31337;None;2;1");
        assert_eq!("31337;None;2;1".parse::<CastPayload>().unwrap(), absent);
    }

    #[test]
    fn garbage_credential_is_treated_as_absent() {
        let payload: CastPayload = "12000;xyz;1;1".parse().unwrap();
        assert!(payload.credential.is_none());
    }

    #[test]
    fn malformed_records() {
        let defect = |record: &str| match record.parse::<CastPayload>() {
            Err(Error::MalformedPayload(defect)) => defect,
            other => panic!("expected malformed payload for {:?}, got {:?}", record, other),
        };

        assert_eq!(defect(""), PayloadDefect::MissingField("mark"));
        assert_eq!(defect("12000;1"), PayloadDefect::MissingField("candidate"));
        assert_eq!(defect("12000;1;3"), PayloadDefect::MissingField("mode"));
        assert_eq!(defect("abc;1;3;1"), PayloadDefect::BadNumber("mark"));
        assert_eq!(defect("12000;1;x;1"), PayloadDefect::BadNumber("candidate"));
        assert_eq!(defect("12000;1;3;7"), PayloadDefect::BadMode("7".to_owned()));
        assert_eq!(defect("12000;1;3;1;9"), PayloadDefect::TrailingFields);
    }

    #[test]
    fn mode_tags() {
        assert_eq!(CastMode::try_from(1u8).unwrap(), CastMode::Initial);
        assert_eq!(CastMode::try_from(2u8).unwrap(), CastMode::Revision);
        assert!(CastMode::try_from(0u8).is_err());
    }
}
