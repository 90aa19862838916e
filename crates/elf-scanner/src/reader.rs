//! ELF64 파일 헤더와 프로그램 헤더(세그먼트) 테이블 리더
//!
//! [`ElfImage::parse`]는 완전한 헤더와 세그먼트 목록을 만들거나 `None`을 반환합니다.
//! 부분적으로 채워진 구조체는 만들지 않습니다.
//!
//! # 레이아웃 (ELF64)
//!
//! ```text
//! 0x00  e_ident[16]   magic(4) class(1) data(1) version(1) ...
//! 0x10  e_type u16    0x12 e_machine u16   0x14 e_version u32
//! 0x18  e_entry u64   0x20 e_phoff u64     0x28 e_shoff u64
//! 0x30  e_flags u32   0x34 e_ehsize u16    0x36 e_phentsize u16
//! 0x38  e_phnum u16   ...
//! ```

use std::path::Path;

use tracing::debug;

use crate::error::ElfScanError;

/// ELF 매직 바이트
pub const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];

/// 64비트 클래스 (`EI_CLASS`)
pub const ELFCLASS64: u8 = 2;

/// ELF64 파일 헤더 크기
pub const EHDR_SIZE: usize = 64;

/// ELF64 프로그램 헤더 엔트리 크기
pub const PHDR_SIZE: usize = 56;

const PT_LOAD: u32 = 1;
const PT_DYNAMIC: u32 = 2;

/// 바이트 순서 (`EI_DATA`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    /// `ELFDATA2LSB`
    Little,
    /// `ELFDATA2MSB`
    Big,
}

impl Endianness {
    fn from_ident(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Little),
            2 => Some(Self::Big),
            _ => None,
        }
    }
}

/// 파싱된 ELF64 파일 헤더
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfHeader {
    /// 바이트 순서
    pub endianness: Endianness,
    /// 오브젝트 파일 타입 (`ET_EXEC`, `ET_DYN` 등)
    pub file_type: u16,
    /// 대상 아키텍처
    pub machine: u16,
    /// 엔트리 포인트 가상 주소
    pub entry: u64,
    /// 프로그램 헤더 테이블 파일 오프셋
    pub phoff: u64,
    /// 헤더에 기록된 프로그램 헤더 엔트리 크기
    pub phentsize: u16,
    /// 프로그램 헤더 엔트리 수
    pub phnum: u16,
}

/// 세그먼트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// `PT_LOAD`
    Load,
    /// `PT_DYNAMIC`
    Dynamic,
    /// 그 외 (원본 `p_type` 값 유지)
    Other(u32),
}

impl SegmentKind {
    /// `p_type` 값을 세그먼트 종류로 변환합니다.
    pub fn from_u32(value: u32) -> Self {
        match value {
            PT_LOAD => Self::Load,
            PT_DYNAMIC => Self::Dynamic,
            other => Self::Other(other),
        }
    }
}

/// 프로그램 헤더 한 개
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// 세그먼트 종류
    pub kind: SegmentKind,
    /// 파일 내 오프셋
    pub offset: u64,
    /// 가상 주소
    pub vaddr: u64,
    /// 파일상 크기
    pub filesz: u64,
    /// 메모리상 크기
    pub memsz: u64,
}

impl Segment {
    /// 가상 주소가 이 세그먼트의 `[vaddr, vaddr + memsz)` 범위에 있으면
    /// 대응하는 파일 오프셋을 반환합니다.
    pub fn file_offset_of(&self, vaddr: u64) -> Option<u64> {
        if vaddr < self.vaddr {
            return None;
        }
        let delta = vaddr - self.vaddr;
        if delta >= self.memsz {
            return None;
        }
        self.offset.checked_add(delta)
    }
}

/// 바이트 순서를 고려한 경계 검사 읽기
#[derive(Clone, Copy)]
pub(crate) struct ByteView<'a> {
    data: &'a [u8],
    endianness: Endianness,
}

impl<'a> ByteView<'a> {
    pub(crate) fn new(data: &'a [u8], endianness: Endianness) -> Self {
        Self { data, endianness }
    }

    fn array<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        let end = offset.checked_add(N)?;
        self.data.get(offset..end)?.try_into().ok()
    }

    pub(crate) fn u16_at(&self, offset: usize) -> Option<u16> {
        let raw = self.array::<2>(offset)?;
        Some(match self.endianness {
            Endianness::Little => u16::from_le_bytes(raw),
            Endianness::Big => u16::from_be_bytes(raw),
        })
    }

    pub(crate) fn u32_at(&self, offset: usize) -> Option<u32> {
        let raw = self.array::<4>(offset)?;
        Some(match self.endianness {
            Endianness::Little => u32::from_le_bytes(raw),
            Endianness::Big => u32::from_be_bytes(raw),
        })
    }

    pub(crate) fn u64_at(&self, offset: usize) -> Option<u64> {
        let raw = self.array::<8>(offset)?;
        Some(match self.endianness {
            Endianness::Little => u64::from_le_bytes(raw),
            Endianness::Big => u64::from_be_bytes(raw),
        })
    }
}

/// 메모리에 적재된 ELF64 이미지
///
/// 헤더와 세그먼트 테이블이 모두 파일 범위 안에 있음이 보장됩니다.
#[derive(Debug, Clone)]
pub struct ElfImage {
    data: Vec<u8>,
    header: ElfHeader,
    segments: Vec<Segment>,
}

impl ElfImage {
    /// 파일을 읽어 ELF64 이미지로 파싱합니다.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(image))`: 지원하는 ELF64 파일
    /// - `Ok(None)`: ELF64가 아니거나 헤더가 잘린 파일
    /// - `Err(..)`: 파일을 읽을 수 없거나 `max_size`를 초과
    pub fn open(path: &Path, max_size: u64) -> Result<Option<Self>, ElfScanError> {
        let io_err = |source| ElfScanError::Io {
            path: path.display().to_string(),
            source,
        };

        let size = std::fs::metadata(path).map_err(io_err)?.len();
        if size > max_size {
            return Err(ElfScanError::FileTooBig {
                path: path.display().to_string(),
                size,
                max: max_size,
            });
        }

        let data = std::fs::read(path).map_err(io_err)?;
        let image = Self::parse(data);
        if image.is_none() {
            debug!(path = %path.display(), "not an ELF64 binary, skipping");
        }
        Ok(image)
    }

    /// 바이트 버퍼를 ELF64 이미지로 파싱합니다.
    ///
    /// 매직, 클래스, 바이트 순서를 먼저 확인한 뒤에만 나머지 필드를 읽습니다.
    pub fn parse(data: Vec<u8>) -> Option<Self> {
        if data.len() < EHDR_SIZE || data[..4] != ELF_MAGIC {
            return None;
        }
        if data[4] != ELFCLASS64 {
            return None;
        }
        let endianness = Endianness::from_ident(data[5])?;
        let view = ByteView::new(&data, endianness);

        let header = ElfHeader {
            endianness,
            file_type: view.u16_at(0x10)?,
            machine: view.u16_at(0x12)?,
            entry: view.u64_at(0x18)?,
            phoff: view.u64_at(0x20)?,
            phentsize: view.u16_at(0x36)?,
            phnum: view.u16_at(0x38)?,
        };

        let segments = read_segments(view, &header)?;

        Some(Self {
            data,
            header,
            segments,
        })
    }

    /// 파일 헤더
    pub fn header(&self) -> &ElfHeader {
        &self.header
    }

    /// 세그먼트 목록 (파일 순서)
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// 바이트 순서
    pub fn endianness(&self) -> Endianness {
        self.header.endianness
    }

    /// 원본 바이트
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// 가상 주소를 파일 오프셋으로 변환합니다.
    ///
    /// 로드 가능한 세그먼트를 파일 순서로 검사하며 처음 일치하는 세그먼트가 사용됩니다.
    /// 세그먼트 겹침은 검증하지 않습니다.
    pub fn resolve(&self, vaddr: u64) -> Option<u64> {
        self.segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Load)
            .find_map(|s| s.file_offset_of(vaddr))
    }

    /// 첫 번째 `PT_DYNAMIC` 세그먼트
    pub fn dynamic_segment(&self) -> Option<&Segment> {
        self.segments.iter().find(|s| s.kind == SegmentKind::Dynamic)
    }

    /// 파일 오프셋 범위를 읽습니다. 범위를 벗어나면 `None`입니다.
    pub fn bytes_at(&self, offset: u64, len: u64) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        let len = usize::try_from(len).ok()?;
        let end = start.checked_add(len)?;
        self.data.get(start..end)
    }

    pub(crate) fn view(&self) -> ByteView<'_> {
        ByteView::new(&self.data, self.header.endianness)
    }
}

/// 프로그램 헤더 테이블을 읽습니다.
///
/// 엔트리 크기는 ELF64 고정값(56)을 사용하며 `e_phentsize`는 참고만 합니다.
/// 테이블이 파일 끝을 넘어가면 `None`을 반환합니다.
fn read_segments(view: ByteView<'_>, header: &ElfHeader) -> Option<Vec<Segment>> {
    if usize::from(header.phentsize) != PHDR_SIZE && header.phnum > 0 {
        debug!(
            phentsize = header.phentsize,
            "unexpected program header entry size, using ELF64 layout"
        );
    }

    let base = usize::try_from(header.phoff).ok()?;
    let table_len = usize::from(header.phnum).checked_mul(PHDR_SIZE)?;
    let table_end = base.checked_add(table_len)?;
    if header.phnum > 0 && table_end > view.data.len() {
        debug!(
            phoff = header.phoff,
            phnum = header.phnum,
            file_len = view.data.len(),
            "program header table extends past end of file"
        );
        return None;
    }

    let mut segments = Vec::with_capacity(usize::from(header.phnum));
    for i in 0..usize::from(header.phnum) {
        let at = base + i * PHDR_SIZE;
        segments.push(Segment {
            kind: SegmentKind::from_u32(view.u32_at(at)?),
            offset: view.u64_at(at + 0x08)?,
            vaddr: view.u64_at(at + 0x10)?,
            filesz: view.u64_at(at + 0x20)?,
            memsz: view.u64_at(at + 0x28)?,
        });
    }
    Some(segments)
}


#[cfg(test)]
mod tests {
    use super::fixture::{Phdr, image};
    use super::*;
    use proptest::prelude::*;

    fn load(offset: u64, vaddr: u64, memsz: u64) -> Phdr {
        Phdr {
            p_type: PT_LOAD,
            offset,
            vaddr,
            filesz: memsz,
            memsz,
        }
    }

    #[test]
    fn parses_little_endian_header() {
        let data = image(Endianness::Little, &[load(0, 0x400000, 0x1000)]);
        let elf = ElfImage::parse(data).expect("valid ELF64");
        assert_eq!(elf.endianness(), Endianness::Little);
        assert_eq!(elf.header().machine, 62);
        assert_eq!(elf.header().entry, 0x1040);
        assert_eq!(elf.segments().len(), 1);
        assert_eq!(elf.segments()[0].kind, SegmentKind::Load);
    }

    #[test]
    fn parses_big_endian_header() {
        let data = image(Endianness::Big, &[load(0, 0x10000, 0x2000)]);
        let elf = ElfImage::parse(data).expect("valid ELF64");
        assert_eq!(elf.endianness(), Endianness::Big);
        assert_eq!(elf.segments()[0].vaddr, 0x10000);
        assert_eq!(elf.segments()[0].memsz, 0x2000);
    }

    #[test]
    fn exact_length_segment_table_is_accepted() {
        let data = image(
            Endianness::Little,
            &[load(0, 0x1000, 0x100), load(0x100, 0x2000, 0x100)],
        );
        assert_eq!(data.len(), EHDR_SIZE + 2 * PHDR_SIZE);
        let elf = ElfImage::parse(data).expect("table ending at EOF is complete");
        assert_eq!(elf.segments().len(), 2);
        assert_eq!(elf.resolve(0x2010), Some(0x110));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = image(Endianness::Little, &[]);
        data[1] = b'X';
        assert!(ElfImage::parse(data).is_none());
    }

    #[test]
    fn rejects_32bit_class() {
        let mut data = image(Endianness::Little, &[]);
        data[4] = 1;
        assert!(ElfImage::parse(data).is_none());
    }

    #[test]
    fn rejects_unknown_data_encoding() {
        let mut data = image(Endianness::Little, &[]);
        data[5] = 0;
        assert!(ElfImage::parse(data).is_none());
    }

    #[test]
    fn rejects_short_file() {
        assert!(ElfImage::parse(ELF_MAGIC.to_vec()).is_none());
        assert!(ElfImage::parse(Vec::new()).is_none());
    }

    #[test]
    fn rejects_truncated_segment_table() {
        let mut data = image(
            Endianness::Little,
            &[load(0, 0x1000, 0x100), load(0x100, 0x2000, 0x100)],
        );
        data.truncate(EHDR_SIZE + PHDR_SIZE + 10);
        assert!(ElfImage::parse(data).is_none());
    }

    #[test]
    fn no_segments_is_valid() {
        let elf = ElfImage::parse(image(Endianness::Little, &[])).expect("valid");
        assert!(elf.segments().is_empty());
        assert!(elf.dynamic_segment().is_none());
        assert_eq!(elf.resolve(0x1000), None);
    }

    #[test]
    fn resolve_inside_and_outside_load_segment() {
        let elf = ElfImage::parse(image(Endianness::Little, &[load(0x200, 0x401000, 0x300)]))
            .expect("valid");
        assert_eq!(elf.resolve(0x401000), Some(0x200));
        assert_eq!(elf.resolve(0x401010), Some(0x210));
        assert_eq!(elf.resolve(0x4012ff), Some(0x4ff));
        // 상한은 배타적
        assert_eq!(elf.resolve(0x401300), None);
        assert_eq!(elf.resolve(0x400fff), None);
    }

    #[test]
    fn resolve_ignores_non_load_segments() {
        let dynamic = Phdr {
            p_type: PT_DYNAMIC,
            offset: 0x500,
            vaddr: 0x9000,
            filesz: 0x100,
            memsz: 0x100,
        };
        let elf = ElfImage::parse(image(Endianness::Little, &[dynamic])).expect("valid");
        assert_eq!(elf.resolve(0x9000), None);
        assert!(elf.dynamic_segment().is_some());
    }

    #[test]
    fn resolve_first_matching_segment_wins() {
        let elf = ElfImage::parse(image(
            Endianness::Little,
            &[load(0x100, 0x1000, 0x1000), load(0x900, 0x1800, 0x1000)],
        ))
        .expect("valid");
        assert_eq!(elf.resolve(0x1900), Some(0xa00));
    }

    #[test]
    fn resolve_does_not_overflow_near_address_space_end() {
        let elf = ElfImage::parse(image(
            Endianness::Little,
            &[load(u64::MAX - 4, u64::MAX - 0x10, 0x10)],
        ))
        .expect("valid");
        assert_eq!(elf.resolve(u64::MAX - 0x10), Some(u64::MAX - 4));
        assert_eq!(elf.resolve(u64::MAX - 1), None);
    }

    #[test]
    fn bytes_at_checks_bounds() {
        let elf = ElfImage::parse(image(Endianness::Little, &[])).expect("valid");
        assert_eq!(elf.bytes_at(0, 4), Some(&ELF_MAGIC[..]));
        assert!(elf.bytes_at(60, 8).is_none());
        assert!(elf.bytes_at(u64::MAX, 1).is_none());
    }

    #[test]
    fn open_missing_file_is_io_error() {
        let result = ElfImage::open(Path::new("/nonexistent/binary"), 1024);
        assert!(matches!(result, Err(ElfScanError::Io { .. })));
    }

    #[test]
    fn open_rejects_file_over_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big");
        std::fs::write(&path, vec![0u8; 128]).unwrap();
        let result = ElfImage::open(&path, 64);
        assert!(matches!(
            result,
            Err(ElfScanError::FileTooBig { size: 128, max: 64, .. })
        ));
    }

    #[test]
    fn open_non_elf_file_is_not_applicable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.sh");
        std::fs::write(&path, b"#!/bin/sh\necho hello\n").unwrap();
        let result = ElfImage::open(&path, 1024).unwrap();
        assert!(result.is_none());
    }

    proptest! {
        #[test]
        fn resolve_matches_linear_formula(
            vaddr in 0u64..(1u64 << 48),
            memsz in 1u64..(1u64 << 20),
            offset in 0u64..(1u64 << 32),
            delta in 0u64..(1u64 << 21),
        ) {
            let elf = ElfImage::parse(image(Endianness::Little, &[load(offset, vaddr, memsz)]))
                .expect("valid");
            let probe = vaddr + delta;
            if delta < memsz {
                prop_assert_eq!(elf.resolve(probe), Some(probe - vaddr + offset));
            } else {
                prop_assert_eq!(elf.resolve(probe), None);
            }
        }

        #[test]
        fn resolve_below_segment_is_unresolved(
            vaddr in 1u64..(1u64 << 48),
            below in 1u64..4096,
        ) {
            let elf = ElfImage::parse(image(Endianness::Big, &[load(0, vaddr, 0x1000)]))
                .expect("valid");
            prop_assert_eq!(elf.resolve(vaddr.saturating_sub(below)), None);
        }

        #[test]
        fn parse_never_panics_on_arbitrary_bytes(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let _ = ElfImage::parse(data);
        }
    }
}
