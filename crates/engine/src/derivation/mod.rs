//! 식별자 및 버전 모델 -- derivation 레코드
//!
//! 스토어가 선언한 속성(key/value 맵)을 [`DerivationRecord`]로 변환하고,
//! `(pname, version)` 으로부터 패키지 식별자([`Identity`])를 계산합니다.
//!
//! - [`aterm`]: `.drv` 파일 파서
//! - [`version`]: 버전 정렬 알고리즘

pub mod aterm;
pub mod version;

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::error::EngineError;

/// derivation 이 선언한 원시 속성 맵
pub type RawMetadata = BTreeMap<String, String>;

/// 원시 소스를 나타내는 예약 패키지 이름 (식별자 없음)
pub const SOURCE_PNAME: &str = "source";

/// 구조화 속성이 JSON 으로 들어있는 예약 키
pub const STRUCTURED_ATTRS_KEY: &str = "__json";

/// 패키지 식별자 (purl 형식: `pkg:nix/{pname}@{version}`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// `(pname, version)` 으로 식별자를 생성합니다.
    ///
    /// `pname` 이 [`SOURCE_PNAME`] 이면 `None` 입니다. 빈 버전은 생략합니다.
    pub fn from_parts(pname: &str, version: &str) -> Option<Self> {
        if pname == SOURCE_PNAME || pname.is_empty() {
            return None;
        }
        let mut purl = format!("pkg:nix/{}", percent_encode(pname));
        if !version.is_empty() {
            purl.push('@');
            purl.push_str(&percent_encode(version));
        }
        Some(Self(purl))
    }

    /// 식별자 문자열
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// derivation 레코드 -- 그래프의 기본 단위
///
/// 동등성과 해시는 `store_path`(build-description 경로)만 사용합니다.
/// 정렬은 `pname` 사전순, 같으면 버전 정렬 알고리즘, 마지막으로 `store_path` 입니다.
#[derive(Debug, Clone, Serialize)]
pub struct DerivationRecord {
    /// derivation 이름 (`hello-2.12`)
    pub name: String,
    /// 전체 패키지 이름 (인터프리터 접두사 보존)
    pub pname: String,
    /// 버전 문자열
    pub version: String,
    /// build-description 경로 (생성 후 불변)
    pub store_path: String,
    /// 연관된 출력 경로 (정렬, 중복 없음, `store_path` 제외)
    pub outputs: BTreeSet<String>,
    /// 패키지 식별자 (`source` 는 없음)
    pub identity: Option<Identity>,
    /// 기본 출력 경로 (`out` 속성)
    pub out: String,
    /// 빌드 플랫폼
    pub system: String,
    /// 적용된 패치
    pub patches: String,
    /// 소스 URL
    pub urls: String,
}

impl DerivationRecord {
    /// 출력 경로를 추가합니다. 빈 경로와 자기 자신의 경로는 무시합니다.
    ///
    /// 새로 추가되었으면 `true` 를 반환합니다.
    pub fn add_output(&mut self, path: &str) -> bool {
        if path.is_empty() || path == self.store_path {
            return false;
        }
        self.outputs.insert(path.to_owned())
    }

    /// 이 레코드가 주어진 경로(자신 또는 출력)를 소유하는지 여부
    pub fn owns_path(&self, path: &str) -> bool {
        self.store_path == path || self.outputs.contains(path)
    }
}

impl PartialEq for DerivationRecord {
    fn eq(&self, other: &Self) -> bool {
        self.store_path == other.store_path
    }
}

impl Eq for DerivationRecord {}

impl Hash for DerivationRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.store_path.hash(state);
    }
}

impl PartialOrd for DerivationRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DerivationRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.store_path == other.store_path {
            return Ordering::Equal;
        }
        self.pname
            .cmp(&other.pname)
            .then_with(|| version::compare_versions(&self.version, &other.version))
            .then_with(|| self.store_path.cmp(&other.store_path))
    }
}

impl fmt::Display for DerivationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.store_path)
    }
}

/// 원시 속성 맵으로 derivation 레코드를 생성합니다.
///
/// `via_output` 이 주어지고 `store_path` 와 다르면 그것을 첫 출력으로,
/// 아니면 `out` 속성을 첫 출력으로 등록합니다.
pub fn parse_derivation(
    raw: &RawMetadata,
    store_path: &str,
    via_output: Option<&str>,
) -> Result<DerivationRecord, EngineError> {
    let structured = structured_attrs(raw, store_path)?;
    let attr = |key: &str| -> Option<String> {
        raw.get(key)
            .cloned()
            .or_else(|| structured.as_ref().and_then(|s| json_attr(s, key)))
    };

    let name = attr("name")
        .filter(|n| !n.is_empty())
        .ok_or_else(|| EngineError::MalformedMetadata {
            path: store_path.to_owned(),
            reason: "missing 'name' attribute".to_owned(),
        })?;
    let declared_pname = attr("pname").unwrap_or_else(|| name.clone());
    let pname = reconstruct_pname(&name, &declared_pname);
    let version = attr("version").unwrap_or_default();
    let identity = Identity::from_parts(&pname, &version);

    let mut record = DerivationRecord {
        name,
        pname,
        version,
        store_path: store_path.to_owned(),
        outputs: BTreeSet::new(),
        identity,
        out: attr("out").unwrap_or_default(),
        system: attr("system").unwrap_or_default(),
        patches: attr("patches").unwrap_or_default(),
        urls: attr("urls").unwrap_or_default(),
    };

    let first_output = match via_output {
        Some(o) if o != store_path => o.to_owned(),
        _ => record.out.clone(),
    };
    record.add_output(&first_output);
    Ok(record)
}

/// `name` 에서 `pname` 의 첫 등장 이전 접두사를 붙여 전체 패키지 이름을 복원합니다.
///
/// 예: name `perl5.36.0-Authen-SASL-2.16`, pname `Authen-SASL` -> `perl5.36.0-Authen-SASL`
pub fn reconstruct_pname(name: &str, pname: &str) -> String {
    if pname.is_empty() {
        return name.to_owned();
    }
    match name.find(pname) {
        Some(idx) => format!("{}{}", &name[..idx], pname),
        None => pname.to_owned(),
    }
}

fn structured_attrs(
    raw: &RawMetadata,
    store_path: &str,
) -> Result<Option<serde_json::Map<String, serde_json::Value>>, EngineError> {
    let Some(blob) = raw.get(STRUCTURED_ATTRS_KEY) else {
        return Ok(None);
    };
    match serde_json::from_str::<serde_json::Value>(blob) {
        Ok(serde_json::Value::Object(map)) => Ok(Some(map)),
        Ok(_) => Err(EngineError::MalformedMetadata {
            path: store_path.to_owned(),
            reason: format!("'{STRUCTURED_ATTRS_KEY}' is not a JSON object"),
        }),
        Err(e) => Err(EngineError::MalformedMetadata {
            path: store_path.to_owned(),
            reason: format!("invalid '{STRUCTURED_ATTRS_KEY}': {e}"),
        }),
    }
}

/// 구조화 속성 값을 문자열로 변환합니다. 배열은 공백으로 이어 붙입니다.
fn json_attr(map: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<String> {
    use serde_json::Value;
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(" "),
        ),
        Value::Null | Value::Object(_) => None,
    }
}
