//! # depdiscover-elf
//!
//! 외부 바이너리 형식 라이브러리 없이 ELF64 실행 파일의 동적 링크 메타데이터를 읽어
//! 필요한 공유 라이브러리(`DT_NEEDED`) 목록을 추출합니다.
//!
//! # Module Structure
//!
//! - [`reader`]: 파일 헤더, 세그먼트 테이블, 가상 주소 → 파일 오프셋 변환 ([`ElfImage`])
//! - [`dynamic`]: 동적 엔트리 파싱과 문자열 테이블 해석 ([`needed_libraries`])
//! - [`error`]: I/O 실패 에러 ([`ElfScanError`])
//!
//! # 에러 처리
//!
//! | 입력 | 결과 |
//! |------|------|
//! | ELF64가 아님, 잘린 헤더 | `Ok(vec![])` |
//! | 정적 바이너리 | `Ok(vec![])` |
//! | 범위를 벗어난 개별 엔트리 | 해당 엔트리만 건너뜀 |
//! | 파일 읽기 실패, 크기 초과 | `Err(ElfScanError)` |

pub mod dynamic;
pub mod error;
pub mod reader;

use std::path::Path;

use depdiscover_core::metrics as m;
use tracing::{debug, info};

pub use dynamic::{DynamicEntry, DynamicTag, dynamic_entries, needed_libraries};
pub use error::ElfScanError;
pub use reader::{ElfHeader, ElfImage, Endianness, Segment, SegmentKind};

/// 바이너리 하나를 스캔해 needed 라이브러리 이름을 파일 순서대로 반환합니다.
///
/// ELF64가 아닌 파일은 에러 없이 빈 목록을 반환합니다.
pub fn scan_needed_libraries(path: &Path, max_size: u64) -> Result<Vec<String>, ElfScanError> {
    let image = match ElfImage::open(path, max_size) {
        Ok(image) => image,
        Err(e) => {
            metrics::counter!(m::ELF_BINARIES_SCANNED_TOTAL, m::LABEL_RESULT => "failure")
                .increment(1);
            return Err(e);
        }
    };
    metrics::counter!(m::ELF_BINARIES_SCANNED_TOTAL, m::LABEL_RESULT => "success").increment(1);

    let Some(image) = image else {
        return Ok(Vec::new());
    };

    let libraries = needed_libraries(&image);
    metrics::counter!(m::ELF_LIBRARIES_EXTRACTED_TOTAL).increment(libraries.len() as u64);

    if libraries.is_empty() {
        debug!(path = %path.display(), "no needed libraries found");
    } else {
        info!(
            path = %path.display(),
            count = libraries.len(),
            "extracted needed libraries"
        );
    }
    Ok(libraries)
}
