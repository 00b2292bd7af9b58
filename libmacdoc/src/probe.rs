//! Document-type identification.
//!
//! Three independent, side-effect-free stages, short-circuiting on the
//! first hit: FinderInfo creator/type lookup, resource-fork `vers`
//! signatures, and data-fork magic sniffing. The magic tables are known to
//! be incomplete for edge files; entries marked unsure stay unsure until a
//! sample proves otherwise.

use crate::ole::Storage;
use libcommon::InputStream;
use libmactoolbox::files::FinderInfo;
use libmactoolbox::resources::{
    Fork, Version, APPLICATION_NAME_ID, MISSING_APPLICATION_MESSAGE_ID,
};
use std::io::{Read, Seek, SeekFrom};

/// Coarse product family of a detected file; the paired label carries the
/// precise product and variant.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum FileKind {
    Acta,
    Application,
    Archive,
    BeagleWorks,
    BinHex,
    ClarisDraw,
    ClarisWorks,
    DocMaker,
    EDoc,
    Excel,
    FrameMaker,
    FreeHand,
    FullWrite,
    GreatWorks,
    HanMacWordJ,
    HanMacWordK,
    Image,
    LightWayText,
    MacDoc,
    MacDraw,
    MacPaint,
    MacWrite,
    MacWriteII,
    MacWritePro,
    MarinerWrite,
    MindWrite,
    More,
    Movie,
    MsWord,
    MsWordPc,
    MsWorks,
    Nisus,
    Ole,
    OnlineEditor,
    PageMaker,
    Pdf,
    PowerPoint,
    Postscript,
    QuarkXPress,
    RagTime,
    Rtf,
    Sound,
    TeachText,
    Text,
    WordPerfect,
    WriteNow,
    WriterPlus,
    ZWrite,
}

/// One probe result: the machine tag plus the human label.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Detection {
    pub kind: FileKind,
    pub label: String,
}

impl Detection {
    #[must_use]
    pub fn new(kind: FileKind, label: impl Into<String>) -> Self {
        Self { kind, label: label.into() }
    }
}

/// Version and name strings found in a resource fork, the second probe
/// stage.
#[derive(Debug, Default)]
pub struct ResourceSummary {
    /// `vers` 1: the file's own version.
    pub file_version: Option<Version>,
    /// `vers` 2 (or the more precise 2002): the producing application.
    pub app_version: Option<Version>,
    /// `STR ` −16396: the producing application's name.
    pub app_name: Option<String>,
    /// `STR ` −16397: the "application missing" message.
    pub missing_message: Option<String>,
}

pub fn resource_summary<T: Read + Seek>(fork: &Fork<T>) -> ResourceSummary {
    let mut summary = ResourceSummary {
        app_name: fork.get_string(APPLICATION_NAME_ID).map(|s| s.to_string_lossy()),
        missing_message: fork
            .get_string(MISSING_APPLICATION_MESSAGE_ID)
            .map(|s| s.to_string_lossy()),
        ..ResourceSummary::default()
    };
    for version in fork.get_version_list() {
        match version.id {
            1 => summary.file_version = Some(version),
            2 => {
                if summary.app_version.is_none() {
                    summary.app_version = Some(version);
                }
            },
            2002 => summary.app_version = Some(version),
            _ => {},
        }
    }
    summary
}

/// FinderInfo lookup.
///
/// `has_styl_128` resolves the SimpleText ambiguity: a `ttxt`/`TEXT` file
/// with a `styl` 128 resource is a styled SimpleText document, otherwise
/// plain text.
#[allow(clippy::too_many_lines)]
pub fn from_finder_info(
    info: FinderInfo,
    has_styl_128: impl FnOnce() -> bool,
) -> Option<Detection> {
    use FileKind as K;

    let creator = info.creator.as_bytes();
    let file_type = info.file_type.as_bytes();

    // by creator, then refined by type
    let by_type: &[(&[u8; 4], K, &str)] = match creator {
        b"AB65" => &[(b"AD65", K::PageMaker, "Pagemaker6.5")],
        b"ACTA" => &[
            (b"OTLN", K::Acta, "Acta"),
            (b"otln", K::Acta, "Acta"),
        ],
        b"ALB3" => &[(b"ALD3", K::PageMaker, "Pagemaker3")],
        b"ALB4" => &[(b"ALD4", K::PageMaker, "Pagemaker4")],
        b"ALB5" => &[(b"ALD5", K::PageMaker, "Pagemaker5")],
        b"ALB6" => &[(b"ALD6", K::PageMaker, "Pagemaker6")],
        b"AOqc" => &[
            (b"TEXT", K::OnlineEditor, "America Online"),
            (b"ttro", K::OnlineEditor, "America Online[readOnly]"),
        ],
        b"AOS1" => &[
            (b"TEXT", K::OnlineEditor, "eWorld"),
            (b"ttro", K::OnlineEditor, "eWorld[readOnly]"),
        ],
        b"BOBO" => &[
            (b"CWDB", K::ClarisWorks, "ClarisWorks/AppleWorks 1.0[Database]"),
            (b"CWD2", K::ClarisWorks, "ClarisWorks/AppleWorks 2.0-3.0[Database]"),
            (b"sWDB", K::ClarisWorks, "ClarisWorks/AppleWorks 2.0-3.0[Database]"),
            (b"CWGR", K::ClarisWorks, "ClarisWorks/AppleWorks[Draw]"),
            (b"sWGR", K::ClarisWorks, "ClarisWorks/AppleWorks 2.0-3.0[Draw]"),
            (b"CWSS", K::ClarisWorks, "ClarisWorks/AppleWorks[SpreadSheet]"),
            (b"CWS2", K::ClarisWorks, "ClarisWorks/AppleWorks 2.0-3.0[SpreadSheet]"),
            (b"sWSS", K::ClarisWorks, "ClarisWorks/AppleWorks 2.0-3.0[SpreadSheet]"),
            (b"CWPR", K::ClarisWorks, "ClarisWorks/AppleWorks[Presentation]"),
            (b"CWWP", K::ClarisWorks, "ClarisWorks/AppleWorks"),
            (b"CWW2", K::ClarisWorks, "ClarisWorks/AppleWorks 2.0-3.0"),
            (b"sWWP", K::ClarisWorks, "ClarisWorks/AppleWorks 2.0-3.0"),
        ],
        b"BWks" => &[
            (b"BWwp", K::BeagleWorks, "BeagleWorks/WordPerfect Works"),
            (b"BWdb", K::BeagleWorks, "BeagleWorks/WordPerfect Works[Database]"),
            (b"BWss", K::BeagleWorks, "BeagleWorks/WordPerfect Works[SpreadSheet]"),
            (b"BWpt", K::BeagleWorks, "BeagleWorks/WordPerfect Works[Presentation]"),
            (b"BWdr", K::BeagleWorks, "BeagleWorks/WordPerfect Works[Draw]"),
        ],
        b"CARO" => &[(b"PDF ", K::Pdf, "Acrobat PDF")],
        b"CDrw" => &[(b"dDoc", K::ClarisDraw, "ClarisDraw")],
        b"DkmR" => &[(b"TEXT", K::DocMaker, "Basic text(created by DOCMaker)")],
        b"Dk@P" => &[(b"APPL", K::DocMaker, "DOCMaker")],
        b"DDAP" => &[(b"DDFL", K::Archive, "DiskDoubler")],
        b"FH50" => &[(b"AGD1", K::FreeHand, "FreeHand 5")],
        b"FHD3" => &[(b"FHA3", K::FreeHand, "FreeHand 3")],
        b"FS03" => &[(b"WRT+", K::WriterPlus, "WriterPlus")],
        b"Fram" => &[
            (b"FASL", K::FrameMaker, "FrameMaker"),
            (b"MIF2", K::FrameMaker, "FrameMaker MIF2.0"),
            (b"MIF3", K::FrameMaker, "FrameMaker MIF3.0"),
            (b"MIF ", K::FrameMaker, "FrameMaker MIF"),
        ],
        b"FWRT" => &[
            (b"FWRT", K::FullWrite, "FullWrite 1.0"),
            (b"FWRM", K::FullWrite, "FullWrite 1.0"),
            (b"FWRI", K::FullWrite, "FullWrite 2.0"),
        ],
        b"JWrt" => &[
            (b"TEXT", K::OnlineEditor, "JoliWrite"),
            (b"ttro", K::OnlineEditor, "JoliWrite[readOnly]"),
        ],
        b"HMiw" => &[(b"IWDC", K::HanMacWordJ, "HanMac Word-J")],
        b"HMdr" => &[(b"DRD2", K::HanMacWordK, "HanMac Word-K")],
        b"LWTE" => &[
            (b"TEXT", K::LightWayText, "LightWayText"),
            (b"MACR", K::LightWayText, "LightWayText[MACR]"),
            (b"pref", K::LightWayText, "LightWayText[Preferences]"),
            (b"ttro", K::LightWayText, "LightWayText[Tutorial]"),
        ],
        b"LWTR" => &[(b"APPL", K::LightWayText, "LightWayText[appli]")],
        b"MACA" => &[(b"WORD", K::MacWrite, "MacWrite")],
        // checkme
        b"MACD" => &[(b"DRWG", K::MacDraw, "MacDraw[unsure]")],
        b"MDsr" => &[(b"APPL", K::MacDoc, "MacDoc(appli)")],
        b"MDvr" => &[(b"MDdc", K::MacDoc, "MacDoc")],
        b"MDRW" => &[(b"DRWG", K::MacDraw, "MacDraw")],
        b"MDPL" => &[(b"DRWG", K::MacDraw, "MacDraw II")],
        b"MMBB" => &[(b"MBBT", K::MarinerWrite, "Mariner Write")],
        b"MORE" => &[(b"MORE", K::More, "More")],
        b"MOR2" => &[
            (b"MOR2", K::More, "More 2"),
            (b"MOR3", K::More, "More 3"),
        ],
        b"MPNT" => &[(b"PNTG", K::MacPaint, "MacPaint")],
        b"MWII" => &[(b"MW2D", K::MacWriteII, "MacWrite II")],
        b"MWPR" => &[(b"MWPd", K::MacWritePro, "MacWrite Pro")],
        b"MSWD" => &[
            (b"WDBN", K::MsWord, "Microsoft Word 3-5"),
            (b"GLOS", K::MsWord, "Microsoft Word 3-5[glossary]"),
            (b"W6BN", K::MsWord, "Microsoft Word 6"),
            (b"W8BN", K::MsWord, "Microsoft Word 8"),
            (b"W8TN", K::MsWord, "Microsoft Word 8[W8TN]"),
            (b"WXBN", K::MsWord, "Microsoft Word 97-2004"),
        ],
        b"MSWK" => &[
            (b"AWWP", K::MsWorks, "Microsoft Works 3"),
            (b"AWDB", K::MsWorks, "Microsoft Works 3-4[database]"),
            (b"AWDR", K::MsWorks, "Microsoft Works 3-4[draw]"),
            (b"AWSS", K::MsWorks, "Microsoft Works 3-4[spreadsheet]"),
            (b"RLRB", K::MsWorks, "Microsoft Works 4"),
            (b"sWRB", K::MsWorks, "Microsoft Works 4[template]"),
        ],
        b"NISI" => &[
            (b"TEXT", K::Nisus, "Nisus"),
            (b"GLOS", K::Nisus, "Nisus[glossary]"),
            (b"SMAC", K::Nisus, "Nisus[macros]"),
            (b"edtt", K::Nisus, "Nisus[lock]"),
        ],
        b"PPNT" => &[(b"SLDS", K::PowerPoint, "Microsoft PowerPoint")],
        b"PPT3" => &[(b"SLD8", K::PowerPoint, "Microsoft PowerPoint 97-2004")],
        b"PSIP" => &[(b"AWWP", K::MsWorks, "Microsoft Works 1.0")],
        b"PSI2" => &[
            (b"AWWP", K::MsWorks, "Microsoft Works 2.0"),
            (b"AWSS", K::MsWorks, "Microsoft Works 2.0[spreadsheet]"),
        ],
        b"PWRI" => &[(b"OUTL", K::MindWrite, "MindWrite")],
        b"R#+A" => &[(b"R#+D", K::RagTime, "RagTime")],
        b"RTF " => &[(b"RTF ", K::Rtf, "RTF ")],
        b"SIT!" => &[
            (b"SIT5", K::Archive, "archive SIT"),
            (b"SITD", K::Archive, "archive SIT"),
            (b"SIT!", K::Archive, "archive SIT"),
        ],
        b"TBB5" => &[
            (b"TEXT", K::OnlineEditor, "Tex-Edit"),
            (b"ttro", K::OnlineEditor, "Tex-Edit[readOnly]"),
        ],
        b"WORD" => &[(b"WDBN", K::MsWord, "Microsoft Word 1")],
        b"XCEL" => &[
            (b"XCEL", K::Excel, "Microsoft Excel 1"),
            (b"XLS3", K::Excel, "Microsoft Excel 3"),
            (b"XLS4", K::Excel, "Microsoft Excel 4"),
            (b"XLS5", K::Excel, "Microsoft Excel 5"),
            (b"XLS8", K::Excel, "Microsoft Excel 97-2004"),
            (b"TEXT", K::Excel, "Microsoft Excel[text export]"),
        ],
        b"XPR3" => &[(b"XDOC", K::QuarkXPress, "QuarkXPress")],
        b"ZEBR" => &[
            (b"ZWRT", K::GreatWorks, "GreatWorks"),
            (b"ZTRM", K::GreatWorks, "GreatWorks[comm]"),
            (b"ZDBS", K::GreatWorks, "GreatWorks[database]"),
            (b"ZCAL", K::GreatWorks, "GreatWorks[spreadsheet]"),
            (b"ZOLN", K::GreatWorks, "GreatWorks[outline]"),
            (b"PNTG", K::GreatWorks, "GreatWorks[paint]"),
            (b"ZOBJ", K::GreatWorks, "GreatWorks[draw]"),
            (b"ZCHT", K::GreatWorks, "GreatWorks[chart]"),
        ],
        b"ZWRT" => &[(b"Zart", K::ZWrite, "Z-Write")],
        b"dPro" => &[(b"dDoc", K::MacDraw, "MacDraw Pro")],
        b"eDcR" => &[(b"eDoc", K::EDoc, "eDOC")],
        b"eSRD" => &[(b"APPL", K::EDoc, "eDOC(appli)")],
        b"nX^n" => &[
            (b"nX^d", K::WriteNow, "WriteNow 2"),
            (b"nX^2", K::WriteNow, "WriteNow 3-4"),
        ],
        b"ntxt" => &[(b"TEXT", K::OnlineEditor, "Anarcho")],
        // check me
        b"SSIW" => return Some(fallback(info, K::WordPerfect, "WordPerfect 1.0")),
        b"WPC2" => return Some(fallback(info, K::WordPerfect, "WordPerfect")),
        b"ttxt" => {
            return Some(if file_type == b"TEXT" {
                // Classic Mac OS SimpleText/TeachText, or an ordinary text
                // file: the styl 128 resource decides
                if has_styl_128() {
                    Detection::new(K::TeachText, "TeachText/SimpleText")
                } else {
                    Detection::new(K::Text, "Basic text")
                }
            } else if file_type == b"ttro" {
                Detection::new(K::TeachText, "TeachText/SimpleText[readOnly]")
            } else {
                fallback(info, K::TeachText, "TeachText/SimpleText")
            });
        },
        _ => {
            // creator unknown: a couple of type-only rules
            return match file_type {
                b"AAPL" => Some(creator_fallback(info, K::Application, "Application")),
                b"JFIF" => Some(creator_fallback(info, K::Image, "JPEG")),
                _ => None,
            };
        },
    };

    for (wanted, kind, label) in by_type {
        if file_type == *wanted {
            return Some(Detection::new(*kind, *label));
        }
    }

    // the creator is known but the type is not; most products keep their
    // name with the raw type appended, a few stay silent
    let fallback_label: (FileKind, &str) = match creator {
        b"ACTA" => (K::Acta, "Acta"),
        b"AOqc" => (K::OnlineEditor, "America Online"),
        b"AOS1" => (K::OnlineEditor, "eWorld"),
        b"BOBO" => (K::ClarisWorks, "ClarisWorks/AppleWorks"),
        b"BWks" => (K::BeagleWorks, "BeagleWorks/WordPerfect Works"),
        b"CDrw" => (K::ClarisDraw, "ClarisDraw"),
        b"DkmR" | b"Dk@P" => (K::DocMaker, "DOCMaker"),
        b"DDAP" => (K::Archive, "DiskDoubler"),
        b"AB65" => (K::PageMaker, "Pagemaker6.5"),
        b"ALB3" => (K::PageMaker, "Pagemaker3"),
        b"ALB4" => (K::PageMaker, "Pagemaker4"),
        b"ALB5" => (K::PageMaker, "Pagemaker5"),
        b"ALB6" => (K::PageMaker, "Pagemaker6"),
        b"FH50" => (K::FreeHand, "FreeHand 5"),
        b"FHD3" => (K::FreeHand, "FreeHand 3"),
        b"FS03" => (K::WriterPlus, "WriterPlus"),
        b"Fram" => (K::FrameMaker, "FrameMaker"),
        b"FWRT" => (K::FullWrite, "FullWrite"),
        b"JWrt" => (K::OnlineEditor, "JoliWrite"),
        b"HMiw" => (K::HanMacWordJ, "HanMac Word-J"),
        b"HMdr" => (K::HanMacWordK, "HanMac Word-K"),
        b"LWTE" => (K::LightWayText, "LightWayText"),
        b"MACA" => (K::MacWrite, "MacWrite"),
        b"MDvr" => (K::MacDoc, "MacDoc"),
        b"MDRW" => (K::MacDraw, "MacDraw"),
        b"MDPL" => (K::MacDraw, "MacDraw II"),
        b"MMBB" => (K::MarinerWrite, "Mariner Write"),
        b"MORE" => (K::More, "More"),
        b"MOR2" => (K::More, "More 2-3"),
        b"MPNT" => (K::MacPaint, "MacPaint"),
        b"MWII" => (K::MacWriteII, "MacWrite II"),
        b"MWPR" => (K::MacWritePro, "MacWrite Pro"),
        b"MSWD" => (K::MsWord, "Microsoft Word"),
        b"MSWK" => (K::MsWorks, "Microsoft Works 3-4"),
        b"NISI" => (K::Nisus, "Nisus"),
        b"PPNT" => (K::PowerPoint, "Microsoft PowerPoint"),
        b"PPT3" => (K::PowerPoint, "Microsoft PowerPoint 97-2004"),
        b"PSIP" => (K::MsWorks, "Microsoft Works 1.0"),
        b"PSI2" => (K::MsWorks, "Microsoft Works 2.0"),
        b"PWRI" => (K::MindWrite, "MindWrite"),
        b"R#+A" => (K::RagTime, "RagTime"),
        b"RTF " => (K::Rtf, "RTF"),
        b"SIT!" => (K::Archive, "SIT"),
        b"TBB5" => (K::OnlineEditor, "Tex-Edit"),
        b"WORD" => (K::MsWord, "Microsoft Word 1"),
        b"XCEL" => (K::Excel, "Microsoft Excel"),
        b"XPR3" => (K::QuarkXPress, "QuarkXPress"),
        b"ZEBR" => (K::GreatWorks, "GreatWorks"),
        b"ZWRT" => (K::ZWrite, "Z-Write"),
        b"dPro" => (K::MacDraw, "MacDraw Pro"),
        b"eDcR" => (K::EDoc, "eDOC"),
        b"nX^n" => (K::WriteNow, "WriteNow"),
        _ => return None,
    };

    Some(fallback(info, fallback_label.0, fallback_label.1))
}

/// The creator matched but not the type: keep the product name and show the
/// raw type.
fn fallback(info: FinderInfo, kind: FileKind, name: &str) -> Detection {
    let file_type = info.file_type.as_bytes();
    let label = match file_type {
        b"AAPL" => format!("{}[Application]", name),
        b"AIFF" | b"AIFC" => format!("{}[sound]", name),
        _ => format!("{}[{}]", name, info.file_type),
    };
    Detection::new(kind, label)
}

/// The type matched but not the creator: show the raw creator.
fn creator_fallback(info: FinderInfo, kind: FileKind, name: &str) -> Detection {
    Detection::new(kind, format!("{}[{}]", name, info.creator))
}

/// Data-fork magic sniffing: the first ten big-endian 16-bit words plus a
/// few tail-of-file markers. Ambiguous patterns return several candidates.
#[allow(clippy::too_many_lines)]
pub fn from_data_fork<T: Read + Seek>(input: &mut InputStream<T>) -> Vec<Detection> {
    use FileKind as K;

    let mut results = Vec::new();
    if input.length() < 10 {
        return results;
    }
    if input.seek(SeekFrom::Start(0)).is_err() {
        return results;
    }

    let mut val = [0_u16; 5];
    for value in &mut val {
        *value = match input.read_u16() {
            Ok(value) => value,
            Err(_) => return results,
        };
    }

    // ----------- clearly discriminant ------------------
    if val[2] == 0x424f && val[3] == 0x424f && (val[0] >> 8) < 8 {
        return vec![Detection::new(K::ClarisWorks, "ClarisWorks/AppleWorks")];
    }
    if val[0] == 0x4257 && val[1] == 0x6b73 && val[2] == 0x4257 && val[4] == 0x4257 {
        let label = match val[3] {
            0x6462 => "BeagleWorks/WordPerfect Works[Database]",
            0x6472 => "BeagleWorks/WordPerfect Works[Draw]",
            0x7074 => "BeagleWorks/WordPerfect Works[Presentation]",
            0x7373 => "BeagleWorks/WordPerfect Works[Spreadsheet]",
            0x7770 => "BeagleWorks/WordPerfect Works",
            _ => "BeagleWorks/WordPerfect Works[Unknown]",
        };
        return vec![Detection::new(K::BeagleWorks, label)];
    }
    if val[0] == 0x5772 && val[1] == 0x6974 && val[2] == 0x654e && val[3] == 0x6f77 && val[4] == 2 {
        return vec![Detection::new(K::WriteNow, "WriteNow 3-4")];
    }
    if val[0] == 3 && val[1] == 0x4d52 && val[2] == 0x4949 && val[3] == 0x80 {
        return vec![Detection::new(K::More, "More 2")];
    }
    if val[0] == 6 && val[1] == 0x4d4f && val[2] == 0x5233 && val[3] == 0x80 {
        return vec![Detection::new(K::More, "More 3")];
    }
    if val[0] == 0x4646 && val[1] == 0x4646 && val[2] == 0x3030 && val[3] == 0x3030 {
        return vec![Detection::new(K::MarinerWrite, "Mariner Write")];
    }
    if val[0] == 0x4859 && val[1] == 0x4c53 && val[2] == 0x0210 {
        return vec![Detection::new(K::HanMacWordK, "HanMac Word-K")];
    }
    if val[0] == 0x594c && val[1] == 0x5953 && val[2] == 0x100 {
        return vec![Detection::new(K::HanMacWordJ, "HanMac Word-J")];
    }
    if val[0] == 0x2550 && val[1] == 0x4446 {
        return vec![Detection::new(K::Pdf, "PDF")];
    }
    if val[0] == 0x2854 && val[1] == 0x6869 && val[2] == 0x7320 && val[3] == 0x6669 {
        return vec![Detection::new(K::BinHex, "BinHex")];
    }
    if val[0] == 0x2521 && val[1] == 0x5053 && val[2] == 0x2d41 && val[3] == 0x646f && val[4] == 0x6265 {
        return vec![Detection::new(K::Postscript, "PostScript")];
    }
    if val[0] == 0xc5d0 && val[1] == 0xd3c6 {
        return vec![Detection::new(K::Postscript, "Adobe EPS")];
    }
    if val[0] == 0x7b5c && val[1] == 0x7274 && (val[2] >> 8) == 0x66 {
        return vec![Detection::new(K::Rtf, "RTF")];
    }
    if val[2] == 0x6d6f && val[3] == 0x6f76 {
        return vec![Detection::new(K::Movie, "QuickTime movie")];
    }
    if val[0] == 0 && (val[1] >> 8) == 0 && val[2] == 0x6674 && val[3] == 0x7970 && val[4] == 0x3367 {
        return vec![Detection::new(K::Movie, "MP4")];
    }
    if val[0] == 0x4749 && val[1] == 0x4638 && (val[2] == 0x3761 || val[2] == 0x3961) {
        return vec![Detection::new(K::Image, "GIF")];
    }
    if val[0] == 0x8950 && val[1] == 0x4e47 && val[2] == 0x0d0a && val[3] == 0x1a0a {
        return vec![Detection::new(K::Image, "PNG")];
    }
    if val[0] == 0xffd8
        && ((val[1] == 0xffe0 && val[3] == 0x4a46 && val[4] == 0x4946)
            || (val[1] == 0xffe1 && val[3] == 0x4578 && val[4] == 0x6966)
            || (val[1] == 0xffe8 && val[3] == 0x5350 && val[4] == 0x4946))
    {
        return vec![Detection::new(K::Image, "JPEG")];
    }
    if val[0] == 0x4949 && val[1] == 0x2a00 {
        return vec![Detection::new(K::Image, "TIF")];
    }
    if val[0] == 0x4d4d && val[1] == 0x002a {
        return vec![Detection::new(K::Image, "TIFF")];
    }
    if val[0] == 0x4f67 && val[1] == 0x6753 {
        return vec![Detection::new(K::Sound, "OGG data")];
    }

    // ----------- less discriminant ------------------
    if val[0] == 0xd0cf && val[1] == 0x11e0 && val[2] == 0xa1b1 && val[3] == 0x1ae1 {
        if let Ok(storage) = Storage::from_shared(input.shared().clone()) {
            if let Some(label) = storage.root_clsid_label() {
                return vec![Detection::new(K::Ole, label)];
            }
            if let Some(label) = storage.comp_obj_label() {
                return vec![Detection::new(K::Ole, label)];
            }
        }
        return vec![Detection::new(
            K::Ole,
            "OLE file: can be DOC, DOT, PPS, PPT, XLA, XLS, WIZ, WPS(4.0), ...",
        )];
    }
    if val[0] == 0x100 || val[0] == 0x200 {
        let great_works = match (val[1], val[2]) {
            (0x5a57, 0x5254) => Some("GreatWorks"),
            (0x5a4f, 0x4c4e) => Some("GreatWorks[outline]"),
            (0x5a44, 0x4253) => Some("GreatWorks[database]"),
            (0x5a43, 0x414c) => Some("GreatWorks[spreadsheet]"),
            (0x5a4f, 0x424a) => Some("GreatWorks[draw]"),
            (0x5a43, 0x4854) => Some("GreatWorks[chart]"),
            _ => None,
        };
        if let Some(label) = great_works {
            return vec![Detection::new(K::GreatWorks, label)];
        }
    }

    if (val[0] == 0xfe32 && val[1] == 0)
        || (val[0] == 0xfe34 && val[1] == 0)
        || (val[0] == 0xfe37 && (val[1] == 0x23 || val[1] == 0x1c))
    {
        match val[1] {
            0 => {
                if val[0] == 0xfe34 {
                    results.push(Detection::new(K::MsWord, "Microsoft Word 3.0"));
                } else {
                    results.push(Detection::new(K::MsWord, "Microsoft Word 1.0"));
                }
            },
            0x1c => results.push(Detection::new(K::MsWord, "Microsoft Word 4.0")),
            0x23 => results.push(Detection::new(K::MsWord, "Microsoft Word 5.0")),
            _ => {},
        }
    }
    if val[0] == 0 && val[1] == 0 && val[2] == 0 && val[3] == 0
        && ((val[4] >> 8) == 4 || (val[4] >> 8) == 0x44)
    {
        results.push(Detection::new(K::WriteNow, "WriteNow 1-2"));
    }
    if val[0] == 0x2e && val[1] == 0x2e {
        results.push(Detection::new(K::MacWriteII, "MacWrite II"));
    }
    if val[0] == 4 && val[1] == 4 {
        results.push(Detection::new(K::MacWritePro, "MacWrite Pro"));
    }
    if val[0] == 0x7704 {
        results.push(Detection::new(K::MindWrite, "MindWrite"));
    }
    if val[0] == 0x110 {
        results.push(Detection::new(K::WriterPlus, "WriterPlus"));
    }
    if val[0] == 0xdba5 && val[1] == 0x2d00 {
        results.push(Detection::new(K::MsWordPc, "Microsoft Word 2.0[pc]"));
        return results;
    }
    if val[0] == 3 || val[0] == 6 {
        let first = if val[0] == 3 { 2 } else { 1 };
        if val[first] < 0x1000 && val[first + 1] < 0x100 && val[first + 2] < 0x100 {
            results.push(Detection::new(K::MacWrite, "MacWrite[unsure]"));
        }
    }
    if val[0] == 0 {
        let name = match val[1] {
            4 => Some("Microsoft Works 1.0"),
            8 => Some("Microsoft Works 2.0"),
            9 => Some("Microsoft Works 3.0"),
            11 => Some("Microsoft Works 4.0"), // everything except a text file
            _ => None,
        };
        let subtype = if name.is_some() {
            input
                .seek(SeekFrom::Start(16))
                .ok()
                .and_then(|_| input.read_u16().ok())
        } else {
            None
        };
        let suffix = match subtype {
            Some(1) => Some(""),
            Some(2) => Some("[database]"),
            Some(3) => Some("[spreadsheet]"),
            Some(12) => Some("[draw]"),
            _ => None,
        };
        if let (Some(name), Some(suffix)) = (name, suffix) {
            results.push(Detection::new(K::MsWorks, format!("{}{}", name, suffix)));
        }
    }

    // tail-of-file markers
    if input.seek(SeekFrom::End(-4)).is_ok() {
        let tail0 = input.read_u16().unwrap_or(0);
        let tail1 = input.read_u16().unwrap_or(0);
        if tail0 == 0x4657 && tail1 == 0x5254 {
            results.push(Detection::new(K::FullWrite, "FullWrite 2.0"));
        } else if tail0 == 0x4e4c && tail1 == 0x544f {
            results.push(Detection::new(K::Acta, "Acta Classic"));
        } else if tail1 == 0 && val[0] == 1 && (val[1] == 1 || val[1] == 2) {
            results.push(Detection::new(K::Acta, "Acta v2[unsure]"));
        } else if tail0 == 0 && tail1 == 1 {
            // maybe a FullWrite 1.0 file; limited check on the trailing
            // zone table
            let eof = input.length();
            let plausible = input.seek(SeekFrom::End(-38)).is_ok() && (0..2).all(|_| {
                let pos = input.read_u32().unwrap_or(u32::MAX);
                let size = input.read_i32().unwrap_or(-1);
                size > 0 && u64::from(pos) + size as u64 <= eof
            });
            if plausible {
                results.push(Detection::new(K::FullWrite, "FullWrite 1.0[unsure]"));
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use libcommon::InputStream;
    use std::io::Cursor;
    use super::*;

    fn sniff(data: &[u8]) -> Vec<Detection> {
        let mut input = InputStream::new(Cursor::new(data.to_vec())).unwrap();
        from_data_fork(&mut input)
    }

    #[test]
    fn claris_works_magic() {
        let mut data = vec![0x02, 0x00, 0x00, 0x00, 0x42, 0x4f, 0x42, 0x4f];
        data.resize(32, 0);
        let results = sniff(&data);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind, FileKind::ClarisWorks);
    }

    #[test]
    fn beagle_works_subtype() {
        let mut data = Vec::new();
        for value in &[0x4257u16, 0x6b73, 0x4257, 0x7373, 0x4257] {
            data.extend_from_slice(&value.to_be_bytes());
        }
        data.resize(32, 0);
        let results = sniff(&data);
        assert_eq!(results[0].label, "BeagleWorks/WordPerfect Works[Spreadsheet]");
    }

    #[test]
    fn mariner_write_magic() {
        let mut data = b"FFFF0000".to_vec();
        data.resize(32, 0);
        assert_eq!(sniff(&data)[0].kind, FileKind::MarinerWrite);
    }

    #[test]
    fn acta_classic_tail() {
        let mut data = vec![0; 64];
        data[60..64].copy_from_slice(b"NLTO");
        let results = sniff(&data);
        assert!(results.iter().any(|result| result.kind == FileKind::Acta));
    }

    #[test]
    fn finder_info_claris_works() {
        let info = FinderInfo::new(&*b"CWWP", &*b"BOBO");
        let result = from_finder_info(info, || false).unwrap();
        assert_eq!(result.kind, FileKind::ClarisWorks);
        assert_eq!(result.label, "ClarisWorks/AppleWorks");
    }

    #[test]
    fn finder_info_simple_text_depends_on_styl() {
        let info = FinderInfo::new(&*b"TEXT", &*b"ttxt");
        assert_eq!(from_finder_info(info, || true).unwrap().kind, FileKind::TeachText);
        assert_eq!(from_finder_info(info, || false).unwrap().kind, FileKind::Text);
        assert_eq!(from_finder_info(info, || false).unwrap().label, "Basic text");
    }

    #[test]
    fn finder_info_creator_fallback_keeps_the_type() {
        let info = FinderInfo::new(&*b"Huh?", &*b"MSWD");
        let result = from_finder_info(info, || false).unwrap();
        assert_eq!(result.kind, FileKind::MsWord);
        assert_eq!(result.label, "Microsoft Word[Huh?]");
    }

    #[test]
    fn probe_is_deterministic() {
        let mut data = vec![0x00, 0x2e, 0x00, 0x2e];
        data.resize(32, 0);
        let first = sniff(&data);
        let second = sniff(&data);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
