//! derivation 파일 파서 -- ATerm 형식 재귀 하강 파서
//!
//! 스토어의 `.drv` 파일은 다음 형태의 단일 항(term)입니다.
//!
//! ```text
//! Derive([outputs],[inputDrvs],[inputSrcs],"system","builder",[args],[env])
//! ```
//!
//! 파일 내용을 코드로 평가하지 않고 문법대로만 읽어 [`DerivationFile`]을 생성합니다.
//! 파싱 실패 시 바이트 오프셋이 포함된 [`AtermError`]를 반환합니다.

use std::collections::BTreeMap;

use serde::Serialize;

/// 파서 에러 (바이트 오프셋 포함)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("at byte {position}: {message}")]
pub struct AtermError {
    /// 에러가 발생한 입력 위치
    pub position: usize,
    /// 에러 설명
    pub message: String,
}

/// derivation 출력 항목 (`("out","/nix/store/...","","")`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivationOutput {
    /// 출력 이름 (`out`, `dev`, `lib` ...)
    pub name: String,
    /// 출력 경로 (content-addressed 출력은 빈 문자열일 수 있음)
    pub path: String,
    /// 고정 출력 해시 알고리즘
    pub hash_algo: String,
    /// 고정 출력 해시
    pub hash: String,
}

/// 입력 derivation 항목 (`("/nix/store/...drv",["out"])`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputDerivation {
    /// 입력 derivation 경로
    pub path: String,
    /// 사용하는 출력 이름 목록
    pub outputs: Vec<String>,
}

/// 파싱된 derivation 파일
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivationFile {
    /// 출력 목록
    pub outputs: Vec<DerivationOutput>,
    /// 입력 derivation 목록
    pub input_drvs: Vec<InputDerivation>,
    /// 입력 소스 경로 목록
    pub input_srcs: Vec<String>,
    /// 빌드 플랫폼
    pub system: String,
    /// 빌더 실행 파일
    pub builder: String,
    /// 빌더 인자
    pub args: Vec<String>,
    /// 빌드 환경 변수 (선언된 속성)
    pub env: BTreeMap<String, String>,
}

impl DerivationFile {
    /// 이름으로 출력 경로를 찾습니다.
    pub fn output_path(&self, name: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.path.as_str())
            .filter(|p| !p.is_empty())
    }
}

/// `.drv` 파일 내용을 파싱합니다.
pub fn parse(input: &str) -> Result<DerivationFile, AtermError> {
    let mut p = Parser::new(input);
    let drv = p.derive()?;
    p.skip_whitespace();
    if !p.at_end() {
        return Err(p.error("trailing characters after derivation"));
    }
    Ok(drv)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn error(&self, message: impl Into<String>) -> AtermError {
        AtermError {
            position: self.pos,
            message: message.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
    }

    fn expect(&mut self, token: &[u8]) -> Result<(), AtermError> {
        if self.input[self.pos..].starts_with(token) {
            self.pos += token.len();
            Ok(())
        } else {
            Err(self.error(format!(
                "expected '{}'",
                String::from_utf8_lossy(token)
            )))
        }
    }

    fn derive(&mut self) -> Result<DerivationFile, AtermError> {
        self.skip_whitespace();
        self.expect(b"Derive(")?;
        let outputs = self.list(Self::output)?;
        self.expect(b",")?;
        let input_drvs = self.list(Self::input_derivation)?;
        self.expect(b",")?;
        let input_srcs = self.list(Self::string)?;
        self.expect(b",")?;
        let system = self.string()?;
        self.expect(b",")?;
        let builder = self.string()?;
        self.expect(b",")?;
        let args = self.list(Self::string)?;
        self.expect(b",")?;
        let env = self.list(Self::env_pair)?.into_iter().collect();
        self.expect(b")")?;

        Ok(DerivationFile {
            outputs,
            input_drvs,
            input_srcs,
            system,
            builder,
            args,
            env,
        })
    }

    /// `[item,item,...]`
    fn list<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<T, AtermError>,
    ) -> Result<Vec<T>, AtermError> {
        self.expect(b"[")?;
        let mut items = Vec::new();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(item(self)?);
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(_) => return Err(self.error("expected ',' or ']'")),
                None => return Err(self.error("unexpected end of input in list")),
            }
        }
    }

    fn output(&mut self) -> Result<DerivationOutput, AtermError> {
        self.expect(b"(")?;
        let name = self.string()?;
        self.expect(b",")?;
        let path = self.string()?;
        self.expect(b",")?;
        let hash_algo = self.string()?;
        self.expect(b",")?;
        let hash = self.string()?;
        self.expect(b")")?;
        Ok(DerivationOutput {
            name,
            path,
            hash_algo,
            hash,
        })
    }

    fn input_derivation(&mut self) -> Result<InputDerivation, AtermError> {
        self.expect(b"(")?;
        let path = self.string()?;
        self.expect(b",")?;
        let outputs = self.list(Self::string)?;
        self.expect(b")")?;
        Ok(InputDerivation { path, outputs })
    }

    fn env_pair(&mut self) -> Result<(String, String), AtermError> {
        self.expect(b"(")?;
        let key = self.string()?;
        self.expect(b",")?;
        let value = self.string()?;
        self.expect(b")")?;
        Ok((key, value))
    }

    /// 큰따옴표 문자열 (`\" \\ \n \r \t` 이스케이프 지원)
    fn string(&mut self) -> Result<String, AtermError> {
        let start = self.pos;
        self.expect(b"\"")?;
        let mut buf = Vec::new();
        loop {
            let Some(b) = self.peek() else {
                return Err(AtermError {
                    position: start,
                    message: "unterminated string".to_owned(),
                });
            };
            self.pos += 1;
            match b {
                b'"' => break,
                b'\\' => {
                    let Some(escaped) = self.peek() else {
                        return Err(self.error("unterminated escape sequence"));
                    };
                    self.pos += 1;
                    buf.push(match escaped {
                        b'n' => b'\n',
                        b'r' => b'\r',
                        b't' => b'\t',
                        other => other,
                    });
                }
                other => buf.push(other),
            }
        }
        String::from_utf8(buf).map_err(|_| AtermError {
            position: start,
            message: "string is not valid UTF-8".to_owned(),
        })
    }
}
