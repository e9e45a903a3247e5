//! 도메인 타입 -- 스토어 경로, 의존성 종류, 의존성 엣지
//!
//! 클로저 구성, 그래프 순회, 의존성 귀속이 공유하는 기본 데이터 구조를 정의합니다.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// 경로에서 스토어 디렉토리를 찾지 못했을 때 사용하는 기본값
pub const DEFAULT_STORE_DIR: &str = "/nix/store";

/// build-description 경로 접미사
pub const DERIVATION_SUFFIX: &str = ".drv";

static STORE_DIR_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?P<store_dir>/.+)/[0-9a-z]{32}-").ok());

/// 스토어 경로 보조 타입
///
/// 경로 문자열을 빌려 이름 추출, derivation 여부 판별 등을 제공합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorePath<'a>(&'a str);

impl<'a> StorePath<'a> {
    /// 경로를 감쌉니다.
    pub fn new(path: &'a str) -> Self {
        Self(path)
    }

    /// 원본 경로 문자열
    pub fn as_str(&self) -> &'a str {
        self.0
    }

    /// build-description(`.drv`) 경로인지 여부
    pub fn is_derivation(&self) -> bool {
        self.0.ends_with(DERIVATION_SUFFIX)
    }

    /// 디렉토리를 제외한 마지막 경로 요소 (`<hash>-<name>`)
    pub fn base_name(&self) -> &'a str {
        let trimmed = self.0.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }

    /// 해시 접두사를 제외한 이름 (`hello-2.12`)
    ///
    /// 해시 구분자 `-` 가 없으면 마지막 경로 요소를 그대로 반환합니다.
    pub fn package_name(&self) -> &'a str {
        let base = self.base_name();
        match base.split_once('-') {
            Some((_, name)) if !name.is_empty() => name,
            _ => base,
        }
    }

    /// 경로가 주어진 스토어 디렉토리 아래에 있는지 여부
    pub fn is_in_store(&self, store_dir: &str) -> bool {
        let dir = store_dir.trim_end_matches('/');
        self.0
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1)
    }
}

impl fmt::Display for StorePath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// 경로에서 스토어 디렉토리를 추론합니다 (`/nix/store/<32자 해시>-...` 형식).
///
/// 형식이 맞지 않으면 [`DEFAULT_STORE_DIR`] 을 반환합니다.
pub fn infer_store_dir(path: &str) -> &str {
    STORE_DIR_RE
        .as_ref()
        .and_then(|re| re.captures(path))
        .and_then(|caps| caps.name("store_dir"))
        .map_or(DEFAULT_STORE_DIR, |m| m.as_str())
}

/// 의존성 종류 -- 한 번의 클로저/순회 전체에 적용되는 전역 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// 실행 시 필요한 의존성 (실현된 출력 클로저)
    Runtime,
    /// 빌드 시 필요한 의존성 (build-description 클로저)
    Buildtime,
}

impl DependencyKind {
    /// `buildtime` 플래그로 종류를 선택합니다.
    pub fn from_buildtime(buildtime: bool) -> Self {
        if buildtime {
            Self::Buildtime
        } else {
            Self::Runtime
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runtime => write!(f, "runtime"),
            Self::Buildtime => write!(f, "buildtime"),
        }
    }
}

/// 의존성 엣지: "target 이 src 에 의존한다" (src 가 target 생성에 소비됨)
///
/// 이름은 경로에서 파생되므로 같은 `(target_path, src_path)` 쌍은 하나로 합쳐집니다.
/// 정렬 순서는 `(src_name, src_path, target_name, target_path)` 입니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// 소비되는 쪽 경로
    pub src_path: String,
    /// 소비되는 쪽 이름
    pub src_name: String,
    /// 의존하는 쪽 경로
    pub target_path: String,
    /// 의존하는 쪽 이름
    pub target_name: String,
}

impl Edge {
    /// 두 경로로 엣지를 만들고 이름을 경로에서 파생합니다.
    pub fn new(src_path: impl Into<String>, target_path: impl Into<String>) -> Self {
        let src_path = src_path.into();
        let target_path = target_path.into();
        Self {
            src_name: StorePath::new(&src_path).package_name().to_owned(),
            target_name: StorePath::new(&target_path).package_name().to_owned(),
            src_path,
            target_path,
        }
    }
}

impl PartialOrd for Edge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Edge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.src_name
            .cmp(&other.src_name)
            .then_with(|| self.src_path.cmp(&other.src_path))
            .then_with(|| self.target_name.cmp(&other.target_name))
            .then_with(|| self.target_path.cmp(&other.target_path))
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.target_name, self.src_name)
    }
}
