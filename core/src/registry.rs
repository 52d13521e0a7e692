use once_cell::sync::Lazy;
use std::collections::HashMap;
use uuid::Uuid;

/// Well-known GPT partition type GUIDs.
const BUILTIN_GPT_TYPES: &[(&str, &str)] = &[
    ("024DEE41-33E7-11D3-9D69-0008C781F39F", "MBR partition scheme"),
    ("C12A7328-F81F-11D2-BA4B-00A0C93EC93B", "EFI System partition"),
    ("21686148-6449-6E6F-744E-656564454649", "BIOS Boot partition"),
    ("D3BFE2DE-3DAF-11DF-BA40-E3A556D89593", "Intel Fast Flash (iFFS) partition"),
    ("F4019732-066E-4E12-8273-346C5641494F", "Sony boot partition"),
    ("BFBFAFE7-A34F-448A-9A5B-6213EB736C22", "Lenovo boot partition"),
    ("E3C9E316-0B5C-4DB8-817D-F92DF00215AE", "Microsoft Reserved Partition (MSR)"),
    ("EBD0A0A2-B9E5-4433-87C0-68B6B72699C7", "Basic data partition"),
    ("5808C8AA-7E8F-42E0-85D2-E1E90434CFB3", "Logical Disk Manager (LDM) metadata partition"),
    ("AF9B60A0-1431-4F62-BC68-3311714A69AD", "Logical Disk Manager data partition"),
    ("DE94BBA4-06D1-4D40-A16A-BFD50179D6AC", "Windows Recovery Environment"),
    ("37AFFC90-EF7D-4E96-91C3-2D7AE055B174", "IBM General Parallel File System (GPFS) partition"),
    ("75894C1E-3AEB-11D3-B7C1-7B03A0000000", "HP-UX data partition"),
    ("E2A1E728-32E3-11D6-A682-7B03A0000000", "HP-UX service partition"),
    ("0FC63DAF-8483-4772-8E79-3D69D8477DE4", "Linux filesystem data"),
    ("A19D880F-05FC-4D3B-A006-743F0F84911E", "Linux RAID partition"),
    ("0657FD6D-A4AB-43C4-84E5-0933C84B4F4F", "Linux swap partition"),
    ("E6D6D379-F507-44C2-A23C-238F2A3DF928", "Linux Logical Volume Manager (LVM) partition"),
    ("933AC7E1-2EB4-4F13-B844-0E14E2AEF915", "Linux /home partition"),
    ("7FFEC5C9-2D00-49B7-8941-3EA10A5586B7", "Linux plain dm-crypt partition"),
    ("CA7D7CCB-63ED-4C53-861C-1742536059CC", "Linux LUKS partition"),
    ("8DA63339-0007-60C0-C436-083AC8230908", "Linux reserved"),
    ("83BD6B9D-7F41-11DC-BE0B-001560B84F0F", "FreeBSD boot partition"),
    ("516E7CB4-6ECF-11D6-8FF8-00022D09712B", "FreeBSD data partition"),
    ("516E7CB5-6ECF-11D6-8FF8-00022D09712B", "FreeBSD swap partition"),
    ("516E7CB6-6ECF-11D6-8FF8-00022D09712B", "FreeBSD Unix File System (UFS) partition"),
    ("516E7CB8-6ECF-11D6-8FF8-00022D09712B", "FreeBSD Vinum volume manager partition"),
    ("516E7CBA-6ECF-11D6-8FF8-00022D09712B", "FreeBSD ZFS partition"),
    (
        "48465300-0000-11AA-AA11-00306543ECAC",
        "Apple Hierarchical File System Plus (HFS+) partition",
    ),
    ("55465300-0000-11AA-AA11-00306543ECAC", "Apple UFS"),
    ("52414944-0000-11AA-AA11-00306543ECAC", "Apple RAID partition"),
    ("52414944-5F4F-11AA-AA11-00306543ECAC", "Apple RAID partition, offline"),
    ("426F6F74-0000-11AA-AA11-00306543ECAC", "Apple Boot partition"),
    ("4C616265-6C00-11AA-AA11-00306543ECAC", "Apple Label"),
    ("5265636F-7665-11AA-AA11-00306543ECAC", "Apple TV Recovery partition"),
    ("53746F72-6167-11AA-AA11-00306543ECAC", "Apple Core Storage partition"),
    ("6A82CB45-1DD2-11B2-99A6-080020736631", "Solaris boot partition"),
    ("6A85CF4D-1DD2-11B2-99A6-080020736631", "Solaris root partition"),
    ("6A87C46F-1DD2-11B2-99A6-080020736631", "Solaris swap partition"),
    ("6A8B642B-1DD2-11B2-99A6-080020736631", "Solaris backup partition"),
    ("6A898CC3-1DD2-11B2-99A6-080020736631", "Solaris /usr partition (Apple ZFS)"),
    ("6A8EF2E9-1DD2-11B2-99A6-080020736631", "Solaris /var partition"),
    ("6A90BA39-1DD2-11B2-99A6-080020736631", "Solaris /home partition"),
    ("6A9283A5-1DD2-11B2-99A6-080020736631", "Solaris alternate sector"),
    ("6A945A3B-1DD2-11B2-99A6-080020736631", "Solaris reserved partition"),
    ("49F48D32-B10E-11DC-B99B-0019D1879648", "NetBSD swap partition"),
    ("49F48D5A-B10E-11DC-B99B-0019D1879648", "NetBSD FFS partition"),
    ("49F48D82-B10E-11DC-B99B-0019D1879648", "NetBSD LFS partition"),
    ("49F48DAA-B10E-11DC-B99B-0019D1879648", "NetBSD RAID partition"),
    ("2DB519C4-B10F-11DC-B99B-0019D1879648", "NetBSD concatenated partition"),
    ("2DB519EC-B10F-11DC-B99B-0019D1879648", "NetBSD encrypted partition"),
    ("FE3A2A5D-4F32-41A7-B725-ACCC3285A309", "ChromeOS kernel"),
    ("3CB8E202-3B7E-47DD-8A3C-7FF2A13CFCEC", "ChromeOS rootfs"),
    ("2E0A753D-9E48-43B0-8337-B15192CB1B5E", "ChromeOS future use"),
    ("42465331-3BA3-10F1-802A-4861696B7521", "Haiku BFS"),
    ("85D5E45E-237C-11E1-B4B3-E89A8F7FC3A7", "MidnightBSD boot partition"),
    ("85D5E45A-237C-11E1-B4B3-E89A8F7FC3A7", "MidnightBSD data partition"),
    ("85D5E45B-237C-11E1-B4B3-E89A8F7FC3A7", "MidnightBSD swap partition"),
    ("0394EF8B-237E-11E1-B4B3-E89A8F7FC3A7", "MidnightBSD Unix File System (UFS) partition"),
    ("85D5E45C-237C-11E1-B4B3-E89A8F7FC3A7", "MidnightBSD Vinum volume manager partition"),
    ("85D5E45D-237C-11E1-B4B3-E89A8F7FC3A7", "MidnightBSD ZFS partition"),
];

/// Legacy MBR partition type bytes commonly found in the wild.
const BUILTIN_MBR_TYPES: &[(u8, &str)] = &[
    (0x00, "Empty"),
    (0x01, "FAT12"),
    (0x04, "FAT16 (< 32 MB)"),
    (0x05, "Extended (CHS)"),
    (0x06, "FAT16"),
    (0x07, "NTFS / exFAT / HPFS"),
    (0x0B, "FAT32 (CHS)"),
    (0x0C, "FAT32 (LBA)"),
    (0x0E, "FAT16 (LBA)"),
    (0x0F, "Extended (LBA)"),
    (0x11, "Hidden FAT12"),
    (0x17, "Hidden NTFS / exFAT"),
    (0x1B, "Hidden FAT32"),
    (0x1C, "Hidden FAT32 (LBA)"),
    (0x27, "Windows Recovery Environment"),
    (0x42, "Windows dynamic disk"),
    (0x82, "Linux swap / Solaris"),
    (0x83, "Linux"),
    (0x85, "Linux extended"),
    (0x8E, "Linux LVM"),
    (0xA5, "FreeBSD"),
    (0xA6, "OpenBSD"),
    (0xA8, "Apple UFS"),
    (0xA9, "NetBSD"),
    (0xAB, "Apple boot"),
    (0xAF, "Apple HFS / HFS+"),
    (0xEE, "GPT protective MBR"),
    (0xEF, "EFI System partition"),
    (0xFD, "Linux RAID autodetect"),
];

static GLOBAL: Lazy<PartitionTypeRegistry> = Lazy::new(PartitionTypeRegistry::builtin);

/// Lookup table from partition type codes to human-readable names.
pub struct PartitionTypeRegistry {
    gpt_types: HashMap<Uuid, String>,
    mbr_types: HashMap<u8, String>,
}

impl PartitionTypeRegistry {
    pub fn new() -> Self {
        Self {
            gpt_types: HashMap::new(),
            mbr_types: HashMap::new(),
        }
    }

    /// Registry pre-populated with the well-known GPT and MBR partition types.
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        for (guid, name) in BUILTIN_GPT_TYPES {
            match Uuid::parse_str(guid) {
                Ok(guid) => registry.register_gpt(guid, name.to_string()),
                Err(e) => log::warn!("Skipping malformed builtin partition type {}: {}", guid, e),
            }
        }

        for (code, name) in BUILTIN_MBR_TYPES {
            registry.register_mbr(*code, name.to_string());
        }

        registry
    }

    /// Shared builtin registry.
    pub fn global() -> &'static PartitionTypeRegistry {
        &GLOBAL
    }

    pub fn register_gpt(&mut self, type_guid: Uuid, name: String) {
        self.gpt_types.insert(type_guid, name);
    }

    pub fn register_mbr(&mut self, code: u8, name: String) {
        self.mbr_types.insert(code, name);
    }

    pub fn gpt_name(&self, type_guid: &Uuid) -> Option<&str> {
        self.gpt_types.get(type_guid).map(String::as_str)
    }

    pub fn mbr_name(&self, code: u8) -> Option<&str> {
        self.mbr_types.get(&code).map(String::as_str)
    }

    /// All known GPT types, sorted by name then GUID.
    pub fn list_gpt(&self) -> Vec<(Uuid, &str)> {
        let mut types: Vec<(Uuid, &str)> = self
            .gpt_types
            .iter()
            .map(|(guid, name)| (*guid, name.as_str()))
            .collect();
        types.sort_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(&b.0)));
        types
    }

    pub fn len(&self) -> usize {
        self.gpt_types.len() + self.mbr_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PartitionTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
