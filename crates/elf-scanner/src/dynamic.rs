//! 동적 섹션(`PT_DYNAMIC`) 엔트리와 needed 라이브러리 추출
//!
//! 동적 세그먼트는 16바이트 `(d_tag, d_val)` 쌍의 배열입니다.
//! `DT_NEEDED` 값은 `DT_STRTAB`이 가리키는 문자열 테이블의 바이트 인덱스입니다.

use tracing::{debug, warn};

use crate::reader::ElfImage;

/// 동적 엔트리 크기 (ELF64)
pub const DYN_ENTRY_SIZE: u64 = 16;

const DT_NULL: u64 = 0;
const DT_NEEDED: u64 = 1;
const DT_STRTAB: u64 = 5;
const DT_STRSZ: u64 = 10;

/// 동적 엔트리 태그
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicTag {
    /// `DT_NULL`
    Null,
    /// `DT_NEEDED`
    Needed,
    /// `DT_STRTAB`
    StrTab,
    /// `DT_STRSZ`
    StrSz,
    /// 그 외
    Other(u64),
}

impl DynamicTag {
    /// `d_tag` 값을 태그로 변환합니다.
    pub fn from_u64(value: u64) -> Self {
        match value {
            DT_NULL => Self::Null,
            DT_NEEDED => Self::Needed,
            DT_STRTAB => Self::StrTab,
            DT_STRSZ => Self::StrSz,
            other => Self::Other(other),
        }
    }
}

/// `(tag, value)` 쌍
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicEntry {
    pub tag: DynamicTag,
    pub value: u64,
}

/// 동적 세그먼트의 모든 엔트리를 파일 순서로 반환합니다.
///
/// 엔트리 수는 `filesz / 16`이며 `DT_NULL`에서 멈추지 않습니다.
/// 동적 세그먼트가 없거나 파일 범위를 벗어나면 빈 목록입니다.
pub fn dynamic_entries(image: &ElfImage) -> Vec<DynamicEntry> {
    let Some(segment) = image.dynamic_segment() else {
        debug!("no PT_DYNAMIC segment (static binary)");
        return Vec::new();
    };

    let count = segment.filesz / DYN_ENTRY_SIZE;
    let Some(table_len) = count.checked_mul(DYN_ENTRY_SIZE) else {
        return Vec::new();
    };
    if image.bytes_at(segment.offset, table_len).is_none() {
        warn!(
            offset = segment.offset,
            filesz = segment.filesz,
            "dynamic segment extends past end of file"
        );
        return Vec::new();
    }

    let view = image.view();
    let mut entries = Vec::new();
    for i in 0..count {
        // 위에서 범위를 확인했으므로 변환은 실패하지 않습니다.
        let Some(at) = usize::try_from(segment.offset + i * DYN_ENTRY_SIZE).ok() else {
            break;
        };
        let (Some(tag), Some(value)) = (view.u64_at(at), view.u64_at(at + 8)) else {
            break;
        };
        entries.push(DynamicEntry {
            tag: DynamicTag::from_u64(tag),
            value,
        });
    }
    entries
}

/// needed 라이브러리 이름 목록을 파일 순서로 반환합니다 (중복 유지).
///
/// 문자열 테이블을 찾을 수 없으면 빈 목록을 반환합니다.
/// 테이블 범위를 벗어나는 인덱스나 NUL 종료가 없는 문자열은 해당 엔트리만 건너뜁니다.
pub fn needed_libraries(image: &ElfImage) -> Vec<String> {
    let entries = dynamic_entries(image);
    if entries.is_empty() {
        return Vec::new();
    }

    // 첫 번째 패스: 문자열 테이블 위치와 크기 (중복 시 마지막 값)
    let mut strtab_addr = 0u64;
    let mut strtab_size = 0u64;
    for entry in &entries {
        match entry.tag {
            DynamicTag::StrTab => strtab_addr = entry.value,
            DynamicTag::StrSz => strtab_size = entry.value,
            _ => {}
        }
    }

    if strtab_addr == 0 || strtab_size == 0 {
        debug!(strtab_addr, strtab_size, "dynamic section has no string table");
        return Vec::new();
    }

    let Some(strtab_offset) = image.resolve(strtab_addr) else {
        warn!(
            strtab_addr = format_args!("{strtab_addr:#x}"),
            "string table address is outside every loadable segment"
        );
        return Vec::new();
    };

    let Some(strtab) = image.bytes_at(strtab_offset, strtab_size) else {
        warn!(
            strtab_offset,
            strtab_size, "string table extends past end of file"
        );
        return Vec::new();
    };

    // 두 번째 패스: DT_NEEDED 인덱스로 이름 읽기
    entries
        .iter()
        .filter(|e| e.tag == DynamicTag::Needed)
        .filter_map(|e| read_cstr(strtab, e.value))
        .collect()
}

/// 문자열 테이블에서 `index`부터 NUL까지의 문자열을 읽습니다.
fn read_cstr(strtab: &[u8], index: u64) -> Option<String> {
    let Some(start) = usize::try_from(index).ok().filter(|&i| i < strtab.len()) else {
        debug!(
            index,
            strtab_size = strtab.len(),
            "needed entry index beyond string table, skipping"
        );
        return None;
    };
    let tail = &strtab[start..];
    let Some(len) = tail.iter().position(|&b| b == 0) else {
        debug!(index, "unterminated string in string table, skipping");
        return None;
    };
    Some(String::from_utf8_lossy(&tail[..len]).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Endianness;
    use crate::reader::fixture::{Phdr, append, image, u64b};

    const LOAD_VADDR: u64 = 0x400000;
    const DYN_OFF: u64 = 0x200;
    const STR_OFF: u64 = 0x300;

    /// 하나의 PT_LOAD(파일 전체 매핑) + PT_DYNAMIC 으로 구성된 이미지
    fn build(e: Endianness, dyns: &[(u64, u64)], strtab: &[u8]) -> ElfImage {
        let phdrs = [
            Phdr {
                p_type: 1,
                offset: 0,
                vaddr: LOAD_VADDR,
                filesz: 0x1000,
                memsz: 0x1000,
            },
            Phdr {
                p_type: 2,
                offset: DYN_OFF,
                vaddr: LOAD_VADDR + DYN_OFF,
                filesz: dyns.len() as u64 * DYN_ENTRY_SIZE,
                memsz: dyns.len() as u64 * DYN_ENTRY_SIZE,
            },
        ];
        let mut buf = image(e, &phdrs);
        for (i, (tag, val)) in dyns.iter().enumerate() {
            let at = DYN_OFF as usize + i * 16;
            append(&mut buf, at, &u64b(*tag, e));
            append(&mut buf, at + 8, &u64b(*val, e));
        }
        append(&mut buf, STR_OFF as usize, strtab);
        ElfImage::parse(buf).expect("valid ELF64")
    }

    fn strtab_entries(size: u64) -> [(u64, u64); 2] {
        [(DT_STRTAB, LOAD_VADDR + STR_OFF), (DT_STRSZ, size)]
    }

    #[test]
    fn extracts_needed_in_file_order() {
        let strtab = b"\0libc.so.6\0libm.so.6\0";
        let mut dyns = vec![(DT_NEEDED, 11), (DT_NEEDED, 1)];
        dyns.extend(strtab_entries(strtab.len() as u64));
        let elf = build(Endianness::Little, &dyns, strtab);
        assert_eq!(needed_libraries(&elf), vec!["libm.so.6", "libc.so.6"]);
    }

    #[test]
    fn big_endian_binary_is_supported() {
        let strtab = b"\0libz.so.1\0";
        let mut dyns = strtab_entries(strtab.len() as u64).to_vec();
        dyns.push((DT_NEEDED, 1));
        let elf = build(Endianness::Big, &dyns, strtab);
        assert_eq!(needed_libraries(&elf), vec!["libz.so.1"]);
    }

    #[test]
    fn duplicates_are_preserved() {
        let strtab = b"\0libfoo.so\0";
        let mut dyns = vec![(DT_NEEDED, 1), (DT_NEEDED, 1)];
        dyns.extend(strtab_entries(strtab.len() as u64));
        let elf = build(Endianness::Little, &dyns, strtab);
        assert_eq!(needed_libraries(&elf), vec!["libfoo.so", "libfoo.so"]);
    }

    #[test]
    fn out_of_range_index_is_skipped() {
        let strtab = b"\0liba.so\0";
        let mut dyns = vec![(DT_NEEDED, 1), (DT_NEEDED, 500), (DT_NEEDED, 1)];
        dyns.extend(strtab_entries(strtab.len() as u64));
        let elf = build(Endianness::Little, &dyns, strtab);
        assert_eq!(needed_libraries(&elf), vec!["liba.so", "liba.so"]);
    }

    #[test]
    fn unterminated_string_is_skipped() {
        // 테이블 크기를 마지막 NUL 앞에서 잘라 두 번째 이름이 종료되지 않게 함
        let strtab = b"\0liba.so\0libb.so\0";
        let mut dyns = vec![(DT_NEEDED, 1), (DT_NEEDED, 9)];
        dyns.extend(strtab_entries(strtab.len() as u64 - 1));
        let elf = build(Endianness::Little, &dyns, strtab);
        assert_eq!(needed_libraries(&elf), vec!["liba.so"]);
    }

    #[test]
    fn entries_after_dt_null_are_still_read() {
        let strtab = b"\0liba.so\0";
        let mut dyns = vec![(DT_NULL, 0), (DT_NEEDED, 1)];
        dyns.extend(strtab_entries(strtab.len() as u64));
        let elf = build(Endianness::Little, &dyns, strtab);
        assert_eq!(dynamic_entries(&elf)[0].tag, DynamicTag::Null);
        assert_eq!(needed_libraries(&elf), vec!["liba.so"]);
    }

    #[test]
    fn last_strtab_entry_wins() {
        let strtab = b"\0liba.so\0";
        let dyns = [
            (DT_STRTAB, 0xdead_0000),
            (DT_NEEDED, 1),
            (DT_STRTAB, LOAD_VADDR + STR_OFF),
            (DT_STRSZ, strtab.len() as u64),
        ];
        let elf = build(Endianness::Little, &dyns, strtab);
        assert_eq!(needed_libraries(&elf), vec!["liba.so"]);
    }

    #[test]
    fn missing_string_table_yields_empty() {
        let elf = build(Endianness::Little, &[(DT_NEEDED, 1)], b"\0liba.so\0");
        assert!(needed_libraries(&elf).is_empty());
    }

    #[test]
    fn unresolvable_string_table_yields_empty() {
        let dyns = [(DT_NEEDED, 1), (DT_STRTAB, 0x10), (DT_STRSZ, 9)];
        let elf = build(Endianness::Little, &dyns, b"\0liba.so\0");
        assert!(needed_libraries(&elf).is_empty());
    }

    #[test]
    fn string_table_past_eof_yields_empty() {
        // PT_LOAD 의 memsz 는 파일보다 크므로 주소 변환은 성공하지만 범위 읽기는 실패
        let dyns = [(DT_NEEDED, 1), (DT_STRTAB, LOAD_VADDR + STR_OFF), (DT_STRSZ, 0xC00)];
        let elf = build(Endianness::Little, &dyns, b"\0liba.so\0");
        assert!(needed_libraries(&elf).is_empty());
    }

    #[test]
    fn static_binary_has_no_entries() {
        let phdrs = [Phdr {
            p_type: 1,
            offset: 0,
            vaddr: LOAD_VADDR,
            filesz: 0x100,
            memsz: 0x100,
        }];
        let elf = ElfImage::parse(image(Endianness::Little, &phdrs)).expect("valid");
        assert!(dynamic_entries(&elf).is_empty());
        assert!(needed_libraries(&elf).is_empty());
    }

    #[test]
    fn dynamic_segment_past_eof_yields_empty() {
        let phdrs = [Phdr {
            p_type: 2,
            offset: 0x10_0000,
            vaddr: 0x10_0000,
            filesz: 0x40,
            memsz: 0x40,
        }];
        let elf = ElfImage::parse(image(Endianness::Little, &phdrs)).expect("valid");
        assert!(dynamic_entries(&elf).is_empty());
    }

    #[test]
    fn trailing_partial_entry_is_ignored() {
        let strtab = b"\0liba.so\0";
        let mut dyns = vec![(DT_NEEDED, 1)];
        dyns.extend(strtab_entries(strtab.len() as u64));
        let mut elf_bytes = build(Endianness::Little, &dyns, strtab).data().to_vec();
        // 동적 세그먼트 filesz 에 8바이트를 더해 불완전한 엔트리를 만든다
        let filesz_at = 64 + 56 + 0x20;
        let new_size = dyns.len() as u64 * DYN_ENTRY_SIZE + 8;
        elf_bytes[filesz_at..filesz_at + 8].copy_from_slice(&new_size.to_le_bytes());
        let elf = ElfImage::parse(elf_bytes).expect("valid");
        assert_eq!(dynamic_entries(&elf).len(), dyns.len());
    }
}
