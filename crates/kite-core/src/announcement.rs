//! Mobility protocol messages
//!
//! A mobile producer registers with its rendezvous point by sending a
//! [`MobilityRequest`]. The rendezvous answers with a [`MobilityAck`], a Data
//! packet of content type `KiteAck` whose payload is a
//! [`PrefixAnnouncement`]. Forwarders on the return path install a route
//! for the announced name when they see the ack.

use std::time::Duration;

use bytes::{Buf, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::name::Name;
use crate::packet::{ContentType, Data, Interest};
use crate::tlv::{self, types};

/// Expiration put into an ack when the request carried none
pub const DEFAULT_ACK_EXPIRATION: Duration = Duration::from_millis(1000);

/// Name component separating the rendezvous prefix from the producer suffix
pub const KITE_KEYWORD: &str = "KITE";

/// Binds a name to an expiration period
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrefixAnnouncement {
    pub announced_name: Name,
    pub expiration: Duration,
}

impl PrefixAnnouncement {
    pub fn new(announced_name: Name, expiration: Duration) -> Self {
        Self {
            announced_name,
            expiration,
        }
    }

    /// Encode as a Name block followed by an ExpirationPeriod block
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        tlv::put_name(&mut buf, &self.announced_name);
        tlv::put_nonneg_integer_block(
            &mut buf,
            types::EXPIRATION_PERIOD,
            self.expiration.as_millis() as u64,
        );
        buf.freeze()
    }

    /// Decode from the wire form produced by [`encode`](Self::encode)
    pub fn decode(mut wire: Bytes) -> Result<Self, ProtocolError> {
        let name = tlv::expect_block(&mut wire, types::NAME)?;
        let announced_name = tlv::read_name(name)?;
        let expiration = tlv::expect_block(&mut wire, types::EXPIRATION_PERIOD)?;
        let expiration = Duration::from_millis(tlv::read_nonneg_integer(&expiration)?);
        if wire.has_remaining() {
            return Err(ProtocolError::TrailingBytes(wire.remaining()));
        }
        Ok(Self {
            announced_name,
            expiration,
        })
    }
}

/// Acknowledgment sent by a rendezvous point to a registering producer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobilityAck {
    announcement: PrefixAnnouncement,
}

impl MobilityAck {
    pub fn new(announcement: PrefixAnnouncement) -> Self {
        Self { announcement }
    }

    pub fn announcement(&self) -> &PrefixAnnouncement {
        &self.announcement
    }

    /// Build the ack Data answering the request named `request_name`
    pub fn make_data(&self, request_name: &Name) -> Data {
        Data::new(request_name.clone(), self.announcement.encode())
            .with_content_type(ContentType::KiteAck)
    }

    /// Parse an ack out of a Data packet
    pub fn from_data(data: &Data) -> Result<Self, ProtocolError> {
        if data.content_type != ContentType::KiteAck {
            return Err(ProtocolError::WrongContentType(data.content_type.code()));
        }
        let announcement = PrefixAnnouncement::decode(data.content.clone())?;
        Ok(Self { announcement })
    }
}

/// Registration request from a mobile producer to its rendezvous point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobilityRequest {
    pub rv_prefix: Name,
    pub producer_suffix: Name,
    pub expiration: Option<Duration>,
}

impl MobilityRequest {
    pub fn new(rv_prefix: Name, producer_suffix: Name) -> Self {
        Self {
            rv_prefix,
            producer_suffix,
            expiration: None,
        }
    }

    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// The name the rendezvous point announces on behalf of the producer
    pub fn producer_prefix(&self) -> &Name {
        &self.producer_suffix
    }

    /// Request name: `<rv_prefix>/KITE/<producer_suffix>`
    pub fn name(&self) -> Name {
        self.rv_prefix
            .clone()
            .append(KITE_KEYWORD)
            .concat(&self.producer_suffix)
    }

    /// Build the (unsigned) request Interest
    pub fn make_interest(&self) -> Interest {
        let mut interest = Interest::new(self.name());
        if let Some(expiration) = self.expiration {
            let mut params = BytesMut::new();
            tlv::put_nonneg_integer_block(
                &mut params,
                types::EXPIRATION_PERIOD,
                expiration.as_millis() as u64,
            );
            interest = interest.with_application_parameters(params.freeze());
        }
        interest
    }

    /// Parse a request out of an Interest
    pub fn from_interest(interest: &Interest) -> Result<Self, ProtocolError> {
        let marker = interest
            .name
            .position(KITE_KEYWORD)
            .ok_or_else(|| ProtocolError::MissingMarker(interest.name.to_string()))?;

        let expiration = match &interest.application_parameters {
            Some(params) if !params.is_empty() => {
                let mut wire = params.clone();
                let value = tlv::expect_block(&mut wire, types::EXPIRATION_PERIOD)?;
                if wire.has_remaining() {
                    return Err(ProtocolError::TrailingBytes(wire.remaining()));
                }
                Some(Duration::from_millis(tlv::read_nonneg_integer(&value)?))
            }
            _ => None,
        };

        Ok(Self {
            rv_prefix: interest.name.prefix(marker),
            producer_suffix: interest.name.sub_name(marker + 1),
            expiration,
        })
    }

    /// Build the acknowledgment a rendezvous point returns for this request
    pub fn make_ack(&self) -> MobilityAck {
        MobilityAck::new(PrefixAnnouncement::new(
            self.producer_prefix().clone(),
            self.expiration.unwrap_or(DEFAULT_ACK_EXPIRATION),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(uri: &str) -> Name {
        Name::parse(uri).unwrap()
    }

    #[test]
    fn test_announcement_wire_layout() {
        let pa = PrefixAnnouncement::new(name("/mp"), Duration::from_millis(1000));
        let wire = pa.encode();

        // Name(/mp) then ExpirationPeriod(1000) as a 2-byte integer
        assert_eq!(
            &wire[..],
            &[0x07, 0x04, 0x08, 0x02, b'm', b'p', 0x6D, 0x02, 0x03, 0xE8]
        );
        assert_eq!(PrefixAnnouncement::decode(wire).unwrap(), pa);
    }

    #[test]
    fn test_announcement_trailing_bytes() {
        let mut wire = BytesMut::from(&PrefixAnnouncement::new(name("/mp"), Duration::ZERO).encode()[..]);
        wire.extend_from_slice(&[0xFF]);
        assert_eq!(
            PrefixAnnouncement::decode(wire.freeze()),
            Err(ProtocolError::TrailingBytes(1))
        );
    }

    #[test]
    fn test_ack_data() {
        let ack = MobilityAck::new(PrefixAnnouncement::new(
            name("/mp"),
            Duration::from_secs(300),
        ));
        let data = ack.make_data(&name("/rv/KITE/mp"));

        assert_eq!(data.content_type, ContentType::KiteAck);
        assert_eq!(data.name, name("/rv/KITE/mp"));

        let parsed = MobilityAck::from_data(&data).unwrap();
        assert_eq!(parsed.announcement().announced_name, name("/mp"));
        assert_eq!(parsed.announcement().expiration, Duration::from_secs(300));
    }

    #[test]
    fn test_ack_rejects_plain_data() {
        let data = Data::new(name("/mp/1"), "hello");
        assert_eq!(
            MobilityAck::from_data(&data),
            Err(ProtocolError::WrongContentType(0))
        );

        let garbage = Data::new(name("/mp/1"), "hello").with_content_type(ContentType::KiteAck);
        assert!(MobilityAck::from_data(&garbage).is_err());
    }

    #[test]
    fn test_request_interest() {
        let req = MobilityRequest::new(name("/rv"), name("/mp/video"))
            .with_expiration(Duration::from_secs(10));
        let interest = req.make_interest();
        assert_eq!(interest.name, name("/rv/KITE/mp/video"));
        assert!(interest.application_parameters.is_some());

        let parsed = MobilityRequest::from_interest(&interest).unwrap();
        assert_eq!(parsed, req);
        assert_eq!(parsed.producer_prefix(), &name("/mp/video"));
    }

    #[test]
    fn test_request_default_ack_expiration() {
        let req = MobilityRequest::new(name("/rv"), name("/mp"));
        let interest = req.make_interest();
        assert!(interest.application_parameters.is_none());

        let parsed = MobilityRequest::from_interest(&interest).unwrap();
        assert_eq!(parsed.expiration, None);
        assert_eq!(
            parsed.make_ack().announcement().expiration,
            DEFAULT_ACK_EXPIRATION
        );
    }

    #[test]
    fn test_request_without_marker() {
        let interest = Interest::new(name("/rv/mp"));
        assert!(matches!(
            MobilityRequest::from_interest(&interest),
            Err(ProtocolError::MissingMarker(_))
        ));
    }
}
