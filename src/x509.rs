//! Types common to all things X.509.

use std::{fmt, ops};
use std::str::FromStr;
use std::time::SystemTime;
use chrono::{
    Datelike, DateTime, SubsecRound, TimeDelta, Timelike, TimeZone, Utc
};
use crate::oid;
use crate::der::{Encode, EncodeError, Encoder, Value};
use crate::error::Error;
use crate::oid::Oid;


//------------ Time ----------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Time(DateTime<Utc>);

impl Time {
    pub fn new(dt: DateTime<Utc>) -> Self {
        Time(dt)
    }

    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// Adds number of years to the given date.
    ///
    /// If the given date happens to be a leap date,
    /// the resulting date would be normalized to February 28.
    ///
    /// This is the case even if the resulting year is also a leap year.
    ///
    /// Returns `None` if the result is beyond the range of representable
    /// times.
    pub fn years_from_date(years: i32, date: DateTime<Utc>) -> Option<Self> {
        let year = date.year();
        let month = date.month();

        let day = {
            if date.day() == 29 && month == 2 { 28 } else { date.day() }
        };

        let hour = date.hour();
        let min = date.minute();
        let sec = std::cmp::min(date.second(), 59);

        Utc.with_ymd_and_hms(
            year.checked_add(years)?, month, day, hour, min, sec
        ).single().map(Time)
    }

    /// Adds given years to the current date.
    pub fn years_from_now(years: i32) -> Option<Self> {
        Self::years_from_date(years, Utc::now())
    }

    /// Creates a time from its components.
    ///
    /// # Panics
    ///
    /// The function panics if the components do not describe a valid
    /// point in time.
    pub fn utc(
        year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32
    ) -> Self {
        match Utc.with_ymd_and_hms(year, month, day, hour, min, sec).single() {
            Some(dt) => Time(dt),
            None => panic!("invalid time components")
        }
    }

    pub fn to_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Returns the time with fractional seconds dropped.
    pub fn truncated(self) -> Self {
        Time(self.0.trunc_subsecs(0))
    }

    /// Returns a time value of the type X.509 requires for this time.
    ///
    /// Times between 1950 and 2049 use UTCTime, all others use
    /// GeneralizedTime. Fractional seconds are dropped.
    pub fn to_varied_value(self) -> Value {
        let time = self.truncated();
        if self.year() < 1950 || self.year() > 2049 {
            Value::GeneralizedTime(time)
        }
        else {
            Value::UtcTime(time)
        }
    }
}


//--- Deref and AsRef

impl ops::Deref for Time {
    type Target = DateTime<Utc>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<DateTime<Utc>> for Time {
    fn as_ref(&self) -> &DateTime<Utc> {
        &self.0
    }
}


//--- From and FromStr

impl From<DateTime<Utc>> for Time {
    fn from(time: DateTime<Utc>) -> Self {
        Time(time)
    }
}

impl From<Time> for DateTime<Utc> {
    fn from(time: Time) -> Self {
        time.0
    }
}

impl From<SystemTime> for Time {
    fn from(time: SystemTime) -> Self {
        Time(time.into())
    }
}

impl From<Time> for SystemTime {
    fn from(time: Time) -> Self {
        time.0.into()
    }
}

impl FromStr for Time {
    type Err = chrono::format::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FromStr::from_str(s).map(Time)
    }
}


//--- Add and Sub

impl ops::Add<TimeDelta> for Time {
    type Output = Self;

    fn add(self, duration: TimeDelta) -> Self::Output {
        Self::new(self.0 + duration)
    }
}

impl ops::Sub<TimeDelta> for Time {
    type Output = Self;

    fn sub(self, duration: TimeDelta) -> Self::Output {
        Self::new(self.0 - duration)
    }
}


//--- Display

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}


//------------ Validity ------------------------------------------------------

#[derive(Clone, Debug, Copy, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Validity {
    not_before: Time,
    not_after: Time,
}

impl Validity {
    pub fn new(not_before: Time, not_after: Time) -> Self {
        Validity { not_before, not_after }
    }

    pub fn not_before(self) -> Time {
        self.not_before
    }

    pub fn not_after(self) -> Time {
        self.not_after
    }

    /// Takes the validity from its value.
    ///
    /// This is a sequence of two times, each either a UTCTime or a
    /// GeneralizedTime.
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        match value.as_sequence() {
            Some([not_before, not_after]) => {
                match (not_before.as_time(), not_after.as_time()) {
                    (Some(not_before), Some(not_after)) => {
                        Ok(Validity::new(not_before, not_after))
                    }
                    _ => Err(Error::MalformedCertificate("invalid validity"))
                }
            }
            _ => Err(Error::MalformedCertificate("invalid validity"))
        }
    }
}

impl Encode for Validity {
    fn to_value(&self, _: &Encoder) -> Result<Value, EncodeError> {
        Ok(Value::Sequence(vec![
            self.not_before.to_varied_value(),
            self.not_after.to_varied_value(),
        ]))
    }
}


//------------ AlgorithmIdentifier -------------------------------------------

/// An algorithm identifier.
///
/// ```text
/// AlgorithmIdentifier  ::=  SEQUENCE  {
///      algorithm               OBJECT IDENTIFIER,
///      parameters              ANY DEFINED BY algorithm OPTIONAL  }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AlgorithmIdentifier {
    oid: Oid,
    parameters: Option<Value>,
}

impl AlgorithmIdentifier {
    pub fn new(oid: impl Into<Oid>, parameters: Option<Value>) -> Self {
        AlgorithmIdentifier { oid: oid.into(), parameters }
    }

    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    pub fn parameters(&self) -> Option<&Value> {
        self.parameters.as_ref()
    }

    pub fn from_value(value: &Value) -> Result<Self, Error> {
        let items = match value.as_sequence() {
            Some(items) => items,
            None => {
                return Err(Error::MalformedCertificate(
                    "invalid algorithm identifier"
                ))
            }
        };
        let (oid, parameters) = match items {
            [oid] => (oid, None),
            [oid, parameters] => (oid, Some(parameters.clone())),
            _ => {
                return Err(Error::MalformedCertificate(
                    "invalid algorithm identifier"
                ))
            }
        };
        match oid.as_oid() {
            Some(oid) => Ok(AlgorithmIdentifier::new(oid.clone(), parameters)),
            None => {
                Err(Error::MalformedCertificate(
                    "invalid algorithm identifier"
                ))
            }
        }
    }
}

impl Encode for AlgorithmIdentifier {
    fn to_value(&self, _: &Encoder) -> Result<Value, EncodeError> {
        let mut res = vec![Value::Oid(self.oid.clone())];
        if let Some(ref parameters) = self.parameters {
            res.push(parameters.clone())
        }
        Ok(Value::Sequence(res))
    }
}


//------------ Name ----------------------------------------------------------

/// A distinguished name.
///
/// The name is kept as the ordered list of its attribute type and value
/// pairs. Multi-valued relative distinguished names are flattened in the
/// order they appear. Two names are equal if they have the same pairs in
/// the same order.
///
/// Names taken from a certificate can’t be changed. Only the subject name
/// of a [`CertificateRequest`] accepts changes and only until the request
/// is signed.
///
/// [`CertificateRequest`]: crate::cert::request::CertificateRequest
#[derive(Clone, Debug)]
pub struct Name {
    components: Vec<(Oid, String)>,
    owner: NameOwner,
}

/// Who a name belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum NameOwner {
    /// The name was read from somewhere and is immutable.
    Certificate,

    /// The name belongs to an unsigned certificate request.
    Request,

    /// The name belongs to a certificate request that has been signed.
    Signed,
}

impl Name {
    /// Creates a read-only name from a list of components.
    pub fn from_components(
        components: impl IntoIterator<Item = (Oid, String)>
    ) -> Self {
        Name {
            components: components.into_iter().collect(),
            owner: NameOwner::Certificate,
        }
    }

    /// Creates an empty name owned by a certificate request.
    pub(crate) fn for_request() -> Self {
        Name { components: Vec::new(), owner: NameOwner::Request }
    }

    /// Returns a mutable copy of this name for use in a request.
    pub(crate) fn to_request_name(&self) -> Self {
        Name {
            components: self.components.clone(),
            owner: NameOwner::Request,
        }
    }

    /// Locks the name after the owning request was signed.
    pub(crate) fn lock(&mut self) {
        self.owner = NameOwner::Signed
    }

    pub fn is_mutable(&self) -> bool {
        self.owner == NameOwner::Request
    }

    /// Parses a name from its value.
    ///
    /// ```text
    /// Name ::= RDNSequence
    /// RDNSequence ::= SEQUENCE OF RelativeDistinguishedName
    /// RelativeDistinguishedName ::= SET OF AttributeTypeAndValue
    /// AttributeTypeAndValue ::= SEQUENCE {
    ///     type     AttributeType,
    ///     value    AttributeValue }
    /// ```
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        let rdns = match value.as_sequence() {
            Some(rdns) => rdns,
            None => return Err(Error::MalformedCertificate("invalid name"))
        };
        let mut components = Vec::new();
        for rdn in rdns {
            let avas = match rdn.as_set() {
                Some(avas) if !avas.is_empty() => avas,
                _ => return Err(Error::MalformedCertificate("invalid name"))
            };
            for ava in avas {
                match ava.as_sequence() {
                    Some([oid, value]) => {
                        match (oid.as_oid(), value.as_str()) {
                            (Some(oid), Some(value)) => {
                                components.push((oid.clone(), value.into()))
                            }
                            _ => {
                                return Err(Error::MalformedCertificate(
                                    "invalid name attribute"
                                ))
                            }
                        }
                    }
                    _ => {
                        return Err(Error::MalformedCertificate(
                            "invalid name attribute"
                        ))
                    }
                }
            }
        }
        Ok(Name::from_components(components))
    }

    pub fn components(&self) -> &[(Oid, String)] {
        &self.components
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns the value of the first component with the given type.
    pub fn string_for_oid<T: AsRef<[u64]>>(
        &self, oid: &Oid<T>
    ) -> Option<&str> {
        self.components.iter().find(|item| item.0 == *oid).map(|item| {
            item.1.as_str()
        })
    }

    /// Sets the value of the component with the given type.
    ///
    /// If there already is such a component, the value of the first of
    /// them is replaced. Otherwise a new component is appended.
    pub fn set_string(
        &mut self, oid: impl Into<Oid>, value: impl Into<String>
    ) -> Result<(), Error> {
        self.check_mutable()?;
        let oid = oid.into();
        let value = value.into();
        match self.components.iter_mut().find(|item| item.0 == oid) {
            Some(item) => item.1 = value,
            None => self.components.push((oid, value))
        }
        Ok(())
    }

    /// Removes all components with the given type.
    ///
    /// Returns whether there were any.
    pub fn remove<T: AsRef<[u64]>>(
        &mut self, oid: &Oid<T>
    ) -> Result<bool, Error> {
        self.check_mutable()?;
        let len = self.components.len();
        self.components.retain(|item| item.0 != *oid);
        Ok(self.components.len() != len)
    }

    fn check_mutable(&self) -> Result<(), Error> {
        match self.owner {
            NameOwner::Certificate => Err(Error::ImmutableName),
            NameOwner::Request => Ok(()),
            NameOwner::Signed => Err(Error::RequestAlreadySigned),
        }
    }

    pub fn common_name(&self) -> Option<&str> {
        self.string_for_oid(&oid::AT_COMMON_NAME)
    }

    pub fn set_common_name(
        &mut self, value: impl Into<String>
    ) -> Result<(), Error> {
        self.set_string(oid::AT_COMMON_NAME, value)
    }

    pub fn given_name(&self) -> Option<&str> {
        self.string_for_oid(&oid::AT_GIVEN_NAME)
    }

    pub fn set_given_name(
        &mut self, value: impl Into<String>
    ) -> Result<(), Error> {
        self.set_string(oid::AT_GIVEN_NAME, value)
    }

    pub fn surname(&self) -> Option<&str> {
        self.string_for_oid(&oid::AT_SURNAME)
    }

    pub fn set_surname(
        &mut self, value: impl Into<String>
    ) -> Result<(), Error> {
        self.set_string(oid::AT_SURNAME, value)
    }

    pub fn description(&self) -> Option<&str> {
        self.string_for_oid(&oid::AT_DESCRIPTION)
    }

    pub fn set_description(
        &mut self, value: impl Into<String>
    ) -> Result<(), Error> {
        self.set_string(oid::AT_DESCRIPTION, value)
    }

    pub fn email_address(&self) -> Option<&str> {
        self.string_for_oid(&oid::PKCS9_EMAIL_ADDRESS)
    }

    pub fn set_email_address(
        &mut self, value: impl Into<String>
    ) -> Result<(), Error> {
        self.set_string(oid::PKCS9_EMAIL_ADDRESS, value)
    }
}

/// Returns the short name used when displaying an attribute type.
fn short_name(oid: &Oid) -> Option<&'static str> {
    [
        (oid::AT_COMMON_NAME, "CN"),
        (oid::AT_SURNAME, "SN"),
        (oid::AT_SERIAL_NUMBER, "serialNumber"),
        (oid::AT_COUNTRY_NAME, "C"),
        (oid::AT_LOCALITY_NAME, "L"),
        (oid::AT_STATE_OR_PROVINCE_NAME, "ST"),
        (oid::AT_ORGANIZATION_NAME, "O"),
        (oid::AT_ORGANIZATIONAL_UNIT_NAME, "OU"),
        (oid::AT_DESCRIPTION, "description"),
        (oid::AT_GIVEN_NAME, "GN"),
        (oid::PKCS9_EMAIL_ADDRESS, "emailAddress"),
    ].iter().find(|item| *oid == item.0).map(|item| item.1)
}


//--- PartialEq and Eq

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Eq for Name {}


//--- Encode

impl Encode for Name {
    /// Encodes the name with one attribute per relative distinguished name.
    ///
    /// Email addresses are always IA5String, country names and serial
    /// numbers PrintableString. Everything else is UTF8String, which the
    /// encoder may downgrade.
    fn to_value(&self, _: &Encoder) -> Result<Value, EncodeError> {
        Ok(Value::Sequence(
            self.components.iter().map(|(oid, value)| {
                let value = if *oid == oid::PKCS9_EMAIL_ADDRESS {
                    Value::Ia5String(value.clone())
                }
                else if *oid == oid::AT_COUNTRY_NAME
                    || *oid == oid::AT_SERIAL_NUMBER
                {
                    Value::PrintableString(value.clone())
                }
                else {
                    Value::Utf8String(value.clone())
                };
                Value::Set(vec![
                    Value::Sequence(vec![Value::Oid(oid.clone()), value])
                ])
            }).collect()
        ))
    }
}


//--- Display

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for (oid, value) in &self.components {
            if first {
                first = false
            }
            else {
                f.write_str(", ")?;
            }
            match short_name(oid) {
                Some(name) => write!(f, "{}={}", name, value)?,
                None => write!(f, "{}={}", oid, value)?,
            }
        }
        Ok(())
    }
}


//------------ Testing. One. Two. Three --------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::der::decode;

    fn name(data: &'static [u8]) -> Name {
        Name::from_value(&decode(data).unwrap()).unwrap()
    }

    #[test]
    fn next_year() {
        let now = Utc.with_ymd_and_hms(
            2014, 10, 21, 16, 39, 57
        ).unwrap();
        let future = Time::years_from_date(1, now).unwrap();

        assert_eq!(future.year(), 2015);
        assert_eq!(future.month(), 10);
        assert_eq!(future.day(), 21);
        assert_eq!(future.hour(), 16);
        assert_eq!(future.minute(), 39);
        assert_eq!(future.second(), 57);
    }

    #[test]
    fn next_year_from_leap() {
        let now = Utc.with_ymd_and_hms(
            2020, 2, 29, 16, 39, 57
        ).unwrap();
        let future = Time::years_from_date(10, now).unwrap();

        assert_eq!(future.year(), 2030);
        assert_eq!(future.month(), 2);
        assert_eq!(future.day(), 28);
    }

    #[test]
    fn years_beyond_range() {
        assert!(Time::years_from_date(1, DateTime::<Utc>::MAX_UTC).is_none());
        assert!(Time::years_from_date(i32::MAX, Utc::now()).is_none());
    }

    #[test]
    fn varied_time() {
        assert!(matches!(
            Time::utc(2049, 12, 31, 0, 0, 0).to_varied_value(),
            Value::UtcTime(_)
        ));
        assert!(matches!(
            Time::utc(2050, 1, 1, 0, 0, 0).to_varied_value(),
            Value::GeneralizedTime(_)
        ));
        assert!(matches!(
            Time::utc(1949, 12, 31, 23, 59, 59).to_varied_value(),
            Value::GeneralizedTime(_)
        ));
    }

    #[test]
    fn validity() {
        let validity = Validity::new(
            Time::utc(2020, 1, 1, 0, 0, 0), Time::utc(2021, 1, 1, 0, 0, 0)
        );
        let value = validity.to_value(&Encoder::new()).unwrap();
        assert_eq!(Validity::from_value(&value).unwrap(), validity);
        assert!(Validity::from_value(&Value::Null).is_err());
    }

    #[test]
    fn name_from_value() {
        // SEQUENCE { SET { SEQUENCE { cn, "Test" } }
        //            SET { SEQUENCE { o, "Org" }, SEQUENCE { cn, "Two" } } }
        let name = name(
            b"\x30\x2e\
              \x31\x0d\x30\x0b\x06\x03\x55\x04\x03\x0c\x04Test\
              \x31\x1d\x30\x0a\x06\x03\x55\x04\x0a\x13\x03Org\
                      \x30\x0f\x06\x03\x55\x04\x03\x0c\x08Two Test"
        );
        assert_eq!(name.components().len(), 3);
        assert_eq!(name.common_name(), Some("Test"));
        assert_eq!(
            name.string_for_oid(&oid::AT_ORGANIZATION_NAME), Some("Org")
        );
        assert_eq!(name.to_string(), "CN=Test, O=Org, CN=Two Test");
        assert!(!name.is_mutable());
    }

    #[test]
    fn immutable_name() {
        let mut name = Name::from_components(vec![
            (oid::AT_COMMON_NAME.to_oid(), String::from("Test"))
        ]);
        assert_eq!(name.set_common_name("Other"), Err(Error::ImmutableName));
        assert_eq!(name.common_name(), Some("Test"));
    }

    #[test]
    fn request_name() {
        let mut name = Name::for_request();
        name.set_common_name("Test").unwrap();
        name.set_surname("Surname").unwrap();
        name.set_common_name("Replaced").unwrap();
        assert_eq!(
            name.components(),
            &[
                (oid::AT_COMMON_NAME.to_oid(), String::from("Replaced")),
                (oid::AT_SURNAME.to_oid(), String::from("Surname")),
            ]
        );
        assert!(name.remove(&oid::AT_SURNAME).unwrap());
        assert!(!name.remove(&oid::AT_SURNAME).unwrap());
        name.lock();
        assert_eq!(
            name.set_given_name("Given"), Err(Error::RequestAlreadySigned)
        );
    }

    #[test]
    fn encode_name() {
        let mut name = Name::for_request();
        name.set_common_name("Test").unwrap();
        name.set_email_address("test@example.com").unwrap();
        name.set_string(oid::AT_COUNTRY_NAME, "DE").unwrap();
        let value = name.to_value(&Encoder::new()).unwrap();
        let items = value.as_sequence().unwrap();
        assert_eq!(items.len(), 3);
        let ava = |idx: usize| {
            items[idx].as_set().unwrap()[0].as_sequence().unwrap()[1].clone()
        };
        assert_eq!(ava(0), Value::Utf8String("Test".into()));
        assert_eq!(ava(1), Value::Ia5String("test@example.com".into()));
        assert_eq!(ava(2), Value::PrintableString("DE".into()));
        assert_eq!(Name::from_value(&value).unwrap(), name);
    }
}
