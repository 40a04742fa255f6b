//! Built-in field catalog for `/proc/<pid>/smaps`.

use std::path::PathBuf;

use meminfo_error::Result;
use meminfo_symtab::SlotId;

use crate::catalog::FieldCatalog;
use crate::config::DecoderConfig;

/// Known smaps field lines, one slot each.
///
/// Discriminants are the slot ids; new kernel fields go at the end so
/// existing slots keep their positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum SmapsField {
    Size = 0,
    KernelPageSize,
    MmuPageSize,
    Rss,
    Pss,
    PssDirty,
    SharedClean,
    SharedDirty,
    PrivateClean,
    PrivateDirty,
    Referenced,
    Anonymous,
    Ksm,
    LazyFree,
    AnonHugePages,
    ShmemPmdMapped,
    FilePmdMapped,
    SharedHugetlb,
    PrivateHugetlb,
    Swap,
    SwapPss,
    Locked,
    ThpEligible,
    VmFlags,
}

impl SmapsField {
    pub const ALL: [Self; 24] = [
        Self::Size,
        Self::KernelPageSize,
        Self::MmuPageSize,
        Self::Rss,
        Self::Pss,
        Self::PssDirty,
        Self::SharedClean,
        Self::SharedDirty,
        Self::PrivateClean,
        Self::PrivateDirty,
        Self::Referenced,
        Self::Anonymous,
        Self::Ksm,
        Self::LazyFree,
        Self::AnonHugePages,
        Self::ShmemPmdMapped,
        Self::FilePmdMapped,
        Self::SharedHugetlb,
        Self::PrivateHugetlb,
        Self::Swap,
        Self::SwapPss,
        Self::Locked,
        Self::ThpEligible,
        Self::VmFlags,
    ];

    /// Key as it appears in the field line.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Size => "Size",
            Self::KernelPageSize => "KernelPageSize",
            Self::MmuPageSize => "MMUPageSize",
            Self::Rss => "Rss",
            Self::Pss => "Pss",
            Self::PssDirty => "Pss_Dirty",
            Self::SharedClean => "Shared_Clean",
            Self::SharedDirty => "Shared_Dirty",
            Self::PrivateClean => "Private_Clean",
            Self::PrivateDirty => "Private_Dirty",
            Self::Referenced => "Referenced",
            Self::Anonymous => "Anonymous",
            Self::Ksm => "KSM",
            Self::LazyFree => "LazyFree",
            Self::AnonHugePages => "AnonHugePages",
            Self::ShmemPmdMapped => "ShmemPmdMapped",
            Self::FilePmdMapped => "FilePmdMapped",
            Self::SharedHugetlb => "Shared_Hugetlb",
            Self::PrivateHugetlb => "Private_Hugetlb",
            Self::Swap => "Swap",
            Self::SwapPss => "SwapPss",
            Self::Locked => "Locked",
            Self::ThpEligible => "THPeligible",
            Self::VmFlags => "VmFlags",
        }
    }

    /// snake_case output column name.
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::KernelPageSize => "kernel_page_size",
            Self::MmuPageSize => "mmu_page_size",
            Self::Rss => "rss",
            Self::Pss => "pss",
            Self::PssDirty => "pss_dirty",
            Self::SharedClean => "shared_clean",
            Self::SharedDirty => "shared_dirty",
            Self::PrivateClean => "private_clean",
            Self::PrivateDirty => "private_dirty",
            Self::Referenced => "referenced",
            Self::Anonymous => "anonymous",
            Self::Ksm => "ksm",
            Self::LazyFree => "lazy_free",
            Self::AnonHugePages => "anon_huge_pages",
            Self::ShmemPmdMapped => "shmem_pmd_mapped",
            Self::FilePmdMapped => "file_pmd_mapped",
            Self::SharedHugetlb => "shared_hugetlb",
            Self::PrivateHugetlb => "private_hugetlb",
            Self::Swap => "swap",
            Self::SwapPss => "swap_pss",
            Self::Locked => "locked",
            Self::ThpEligible => "thp_eligible",
            Self::VmFlags => "vm_flags",
        }
    }

    #[must_use]
    pub const fn slot(self) -> SlotId {
        SlotId(self as u32)
    }

    #[must_use]
    pub fn from_slot(slot: SlotId) -> Option<Self> {
        Self::ALL.get(slot.index()).copied()
    }

    /// Catalog of every known field line under `config`.
    pub fn catalog(config: &DecoderConfig) -> Result<FieldCatalog> {
        config.validate()?;
        FieldCatalog::new(
            Self::ALL.iter().map(|field| (field.key(), field.slot())),
            &config.terminator_key,
            config.table_capacity,
        )
    }
}

/// `/proc/<pid>/smaps`.
#[must_use]
pub fn smaps_path(pid: u32) -> PathBuf {
    PathBuf::from(format!("/proc/{pid}/smaps"))
}
