//! Tagged value type for the contract's argument and return encoding
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::error::ClientError;
use super::trade::Address;

/// A value crossing the contract boundary. The ledger's canonical binary
/// form is CBOR: every value is a `[tag, payload]` pair so the decoder can
/// fail fast on an unexpected shape instead of coercing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScVal {
    Bool(bool),
    U32(u32),
    U64(u64),
    I128(i128),
    Str(String),
    /// Short symbol, used for map keys in contract records.
    Sym(String),
    Address(Address),
    Vec(Vec<ScVal>),
    Map(Vec<(ScVal, ScVal)>),
}

const TAG_BOOL: u32 = 0;
const TAG_U32: u32 = 1;
const TAG_U64: u32 = 2;
const TAG_I128: u32 = 3;
const TAG_STR: u32 = 4;
const TAG_SYM: u32 = 5;
const TAG_ADDRESS: u32 = 6;
const TAG_VEC: u32 = 7;
const TAG_MAP: u32 = 8;

impl ScVal {
    pub fn kind(&self) -> &'static str {
        match self {
            ScVal::Bool(_) => "bool",
            ScVal::U32(_) => "u32",
            ScVal::U64(_) => "u64",
            ScVal::I128(_) => "i128",
            ScVal::Str(_) => "str",
            ScVal::Sym(_) => "sym",
            ScVal::Address(_) => "address",
            ScVal::Vec(_) => "vec",
            ScVal::Map(_) => "map",
        }
    }

    pub fn sym(s: &str) -> Self {
        ScVal::Sym(s.to_string())
    }

    /// Look up a map entry by symbol key.
    pub fn map_get(&self, key: &str) -> Option<&ScVal> {
        match self {
            ScVal::Map(entries) => entries.iter().find_map(|(k, v)| match k {
                ScVal::Sym(s) if s == key => Some(v),
                _ => None,
            }),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            ScVal::U32(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ScVal::U64(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            ScVal::I128(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScVal::Str(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_address(&self) -> Option<&Address> {
        match self {
            ScVal::Address(a) => Some(a),
            _ => None,
        }
    }
    pub fn as_vec(&self) -> Option<&[ScVal]> {
        match self {
            ScVal::Vec(items) => Some(items),
            _ => None,
        }
    }

    /// Canonical binary form, base64-wrapped for transport.
    pub fn to_base64(&self) -> Result<String, ClientError> {
        let cbor = minicbor::to_vec(self)
            .map_err(|e| ClientError::Protocol(format!("value encoding failed: {e}")))?;
        Ok(BASE64.encode(cbor))
    }

    pub fn from_base64(payload: &str) -> Result<Self, ClientError> {
        let cbor = BASE64
            .decode(payload)
            .map_err(|e| ClientError::Protocol(format!("return value is not base64: {e}")))?;
        minicbor::decode(&cbor)
            .map_err(|e| ClientError::Protocol(format!("return value is not canonical cbor: {e}")))
    }
}

impl<C> minicbor::Encode<C> for ScVal {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.array(2)?;
        match self {
            ScVal::Bool(v) => {
                e.u32(TAG_BOOL)?.bool(*v)?;
            }
            ScVal::U32(v) => {
                e.u32(TAG_U32)?.u32(*v)?;
            }
            ScVal::U64(v) => {
                e.u32(TAG_U64)?.u64(*v)?;
            }
            ScVal::I128(v) => {
                e.u32(TAG_I128)?.bytes(&v.to_be_bytes())?;
            }
            ScVal::Str(s) => {
                e.u32(TAG_STR)?.str(s)?;
            }
            ScVal::Sym(s) => {
                e.u32(TAG_SYM)?.str(s)?;
            }
            ScVal::Address(a) => {
                e.u32(TAG_ADDRESS)?.str(a.as_str())?;
            }
            ScVal::Vec(items) => {
                e.u32(TAG_VEC)?.array(items.len() as u64)?;
                for item in items {
                    item.encode(e, ctx)?;
                }
            }
            ScVal::Map(entries) => {
                e.u32(TAG_MAP)?.array(entries.len() as u64)?;
                for (k, v) in entries {
                    e.array(2)?;
                    k.encode(e, ctx)?;
                    v.encode(e, ctx)?;
                }
            }
        }
        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for ScVal {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        use minicbor::decode::Error;

        if d.array()? != Some(2) {
            return Err(Error::message("expected a [tag, payload] pair"));
        }
        match d.u32()? {
            TAG_BOOL => Ok(ScVal::Bool(d.bool()?)),
            TAG_U32 => Ok(ScVal::U32(d.u32()?)),
            TAG_U64 => Ok(ScVal::U64(d.u64()?)),
            TAG_I128 => {
                let raw: [u8; 16] = d
                    .bytes()?
                    .try_into()
                    .map_err(|_| Error::message("i128 payload must be 16 bytes"))?;
                Ok(ScVal::I128(i128::from_be_bytes(raw)))
            }
            TAG_STR => Ok(ScVal::Str(d.str()?.to_string())),
            TAG_SYM => Ok(ScVal::Sym(d.str()?.to_string())),
            TAG_ADDRESS => {
                let addr = Address::parse(d.str()?)
                    .map_err(|_| Error::message("address payload is malformed"))?;
                Ok(ScVal::Address(addr))
            }
            TAG_VEC => {
                let len = d
                    .array()?
                    .ok_or(Error::message("vec payload must be definite-length"))?;
                let mut items = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    items.push(ScVal::decode(d, ctx)?);
                }
                Ok(ScVal::Vec(items))
            }
            TAG_MAP => {
                let len = d
                    .array()?
                    .ok_or(Error::message("map payload must be definite-length"))?;
                let mut entries = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    if d.array()? != Some(2) {
                        return Err(Error::message("map entry must be a [key, value] pair"));
                    }
                    let k = ScVal::decode(d, ctx)?;
                    let v = ScVal::decode(d, ctx)?;
                    entries.push((k, v));
                }
                Ok(ScVal::Map(entries))
            }
            tag => Err(Error::message(format!("unknown value tag {tag}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(val: ScVal) -> ScVal {
        let encoding = minicbor::to_vec(&val).unwrap();
        minicbor::decode(&encoding).unwrap()
    }

    #[test]
    fn scalar_encoding() {
        for val in [
            ScVal::Bool(true),
            ScVal::U32(7),
            ScVal::U64(u64::MAX),
            ScVal::I128(-42),
            ScVal::I128(i128::MAX),
            ScVal::Str("widgets".into()),
            ScVal::sym("trade_id"),
        ] {
            assert_eq!(roundtrip(val.clone()), val);
        }
    }

    #[test]
    fn nested_encoding() {
        let val = ScVal::Map(vec![
            (ScVal::sym("amount"), ScVal::I128(1_500)),
            (
                ScVal::sym("tags"),
                ScVal::Vec(vec![ScVal::Str("grain".into()), ScVal::Str("bulk".into())]),
            ),
        ]);
        assert_eq!(roundtrip(val.clone()), val);
    }

    #[test]
    fn base64_transport_roundtrip() {
        let val = ScVal::Vec(vec![ScVal::U32(1), ScVal::U32(2)]);
        let wrapped = val.to_base64().unwrap();
        assert_eq!(ScVal::from_base64(&wrapped).unwrap(), val);
    }

    #[test]
    fn rejects_unknown_tag() {
        // [99, 0] is a well-formed pair with a tag outside the model
        let mut bytes = Vec::new();
        let mut enc = minicbor::Encoder::new(&mut bytes);
        enc.array(2).unwrap().u32(99).unwrap().u32(0).unwrap();
        assert!(minicbor::decode::<ScVal>(&bytes).is_err());
    }

    #[test]
    fn rejects_bad_i128_width() {
        let mut bytes = Vec::new();
        let mut enc = minicbor::Encoder::new(&mut bytes);
        enc.array(2).unwrap().u32(3).unwrap().bytes(&[0u8; 4]).unwrap();
        assert!(minicbor::decode::<ScVal>(&bytes).is_err());
    }

    #[test]
    fn map_lookup_by_symbol() {
        let val = ScVal::Map(vec![(ScVal::sym("state"), ScVal::U32(2))]);
        assert_eq!(val.map_get("state").and_then(ScVal::as_u32), Some(2));
        assert!(val.map_get("missing").is_none());
        // lookups on a non-map shape simply miss
        assert!(ScVal::U32(1).map_get("state").is_none());
    }
}
