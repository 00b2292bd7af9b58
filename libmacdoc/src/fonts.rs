//! Font-id to font-name mapping.
//!
//! Macintosh files reference fonts by their id in the system font table,
//! so the well-known ids get their classic names and per-file font tables
//! register their own correspondences on top. The map is read-only once
//! zone discovery is done.

use encoding::{all::MAC_ROMAN, DecoderTrap, Encoding};
use std::collections::HashMap;

/// The classic system and application font ids.
///
/// See Inside Macintosh: Text and Apple II Technical Note #41; the tail of
/// the table was collected from files in the wild.
static KNOWN_FONTS: &[(i32, &str)] = &[
    (2, "NewYork"),
    (3, "Geneva"),
    (4, "Monaco"),
    (5, "Venise"),
    (6, "London"),
    (7, "Athens"),
    (8, "SanFran"),
    (9, "Toronto"),
    (11, "Cairo"),
    (12, "LosAngeles"),
    (13, "Zapf Dingbats"),
    (14, "Bookman"),
    (16, "Palatino"),
    (18, "Zapf Chancery"),
    (20, "Times"),
    (21, "Helvetica"),
    (22, "Courier"),
    (23, "Symbol"),
    (24, "Mobile"),
    (33, "Avant Garde"),
    (34, "New Century Schoolbook"),
    (150, "scientific"),
    (157, "Cursive"),
    (174, "Futura"),
    (201, "Math"),
    (258, "ProFont"),
    (513, "ISO Latin Nr 1"),
    (514, "PCFont 437"),
    (515, "PCFont 850"),
    (1029, "VT80 Graphics"),
    (1030, "3270 Graphics"),
    (1109, "Trebuchet MS"),
    (1345, "ProFont"),
    (1895, "Nu Sans Regular"),
    (2001, "Arial"),
    (2002, "Charcoal"),
    (2004, "Sand"),
    (2005, "Courier New"),
    (2006, "Techno"),
    (2010, "Times New Roman"),
    (2011, "Wingdings"),
    (2013, "Hoefler Text"),
    (2018, "Hoefler Text Ornaments"),
    (2039, "Impact"),
    (2041, "Mistral"),
    (2305, "Textile"),
    (2307, "Gadget"),
    (2311, "Apple Chancery"),
    (2515, "MT Extra"),
    (4513, "Comic Sans MS"),
    (7092, "Monotype.com"),
    (7102, "Andale Mono"),
    (7203, "Verdenal"),
    (9728, "Espi Sans"),
    (9729, "Charcoal"),
    (9840, "Espy Sans/Copland"),
    (9841, "Espy Sans/Bold"),
    (9842, "Espy Sans Bold/Copland"),
    (10840, "Klang MT"),
    (10890, "Script MT Bold"),
    (10897, "Old English Text MT"),
    (10909, "New Berolina MT"),
    (10957, "Bodoni MT Ultra Bold"),
    (10967, "Arial MT Condensed Light"),
    (11103, "Lydian MT"),
];

const SYMBOL_FONT_ID: i32 = 23;

/// Symbol font code points, from the unicode.org Apple mapping table.
static SYMBOL_UNICODE: &[(u8, u32)] = &[
    (0x20, 0x0020), (0x21, 0x0021), (0x22, 0x2200), (0x23, 0x0023), (0x24, 0x2203),
    (0x25, 0x0025), (0x26, 0x0026), (0x27, 0x220d), (0x28, 0x0028), (0x29, 0x0029),
    (0x2a, 0x2217), (0x2b, 0x002b), (0x2c, 0x002c), (0x2d, 0x2212), (0x2e, 0x002e),
    (0x2f, 0x002f), (0x30, 0x0030), (0x31, 0x0031), (0x32, 0x0032), (0x33, 0x0033),
    (0x34, 0x0034), (0x35, 0x0035), (0x36, 0x0036), (0x37, 0x0037), (0x38, 0x0038),
    (0x39, 0x0039), (0x3a, 0x003a), (0x3b, 0x003b), (0x3c, 0x003c), (0x3d, 0x003d),
    (0x3e, 0x003e), (0x3f, 0x003f), (0x40, 0x2245), (0x41, 0x0391), (0x42, 0x0392),
    (0x43, 0x03a7), (0x44, 0x0394), (0x45, 0x0395), (0x46, 0x03a6), (0x47, 0x0393),
    (0x48, 0x0397), (0x49, 0x0399), (0x4a, 0x03d1), (0x4b, 0x039a), (0x4c, 0x039b),
    (0x4d, 0x039c), (0x4e, 0x039d), (0x4f, 0x039f), (0x50, 0x03a0), (0x51, 0x0398),
    (0x52, 0x03a1), (0x53, 0x03a3), (0x54, 0x03a4), (0x55, 0x03a5), (0x56, 0x03c2),
    (0x57, 0x03a9), (0x58, 0x039e), (0x59, 0x03a8), (0x5a, 0x0396), (0x5b, 0x005b),
    (0x5c, 0x2234), (0x5d, 0x005d), (0x5e, 0x22a5), (0x5f, 0x005f), (0x60, 0xf8e5),
    (0x61, 0x03b1), (0x62, 0x03b2), (0x63, 0x03c7), (0x64, 0x03b4), (0x65, 0x03b5),
    (0x66, 0x03c6), (0x67, 0x03b3), (0x68, 0x03b7), (0x69, 0x03b9), (0x6a, 0x03d5),
    (0x6b, 0x03ba), (0x6c, 0x03bb), (0x6d, 0x03bc), (0x6e, 0x03bd), (0x6f, 0x03bf),
    (0x70, 0x03c0), (0x71, 0x03b8), (0x72, 0x03c1), (0x73, 0x03c3), (0x74, 0x03c4),
    (0x75, 0x03c5), (0x76, 0x03d6), (0x77, 0x03c9), (0x78, 0x03be), (0x79, 0x03c8),
    (0x7a, 0x03b6), (0x7b, 0x007b), (0x7c, 0x007c), (0x7d, 0x007d), (0x7e, 0x223c),
    (0xa0, 0x20ac), (0xa1, 0x03d2), (0xa2, 0x2032), (0xa3, 0x2264), (0xa4, 0x2044),
    (0xa5, 0x221e), (0xa6, 0x0192), (0xa7, 0x2663), (0xa8, 0x2666), (0xa9, 0x2665),
    (0xaa, 0x2660), (0xab, 0x2194), (0xac, 0x2190), (0xad, 0x2191), (0xae, 0x2192),
    (0xaf, 0x2193), (0xb0, 0x00b0), (0xb1, 0x00b1), (0xb2, 0x2033), (0xb3, 0x2265),
    (0xb4, 0x00d7), (0xb5, 0x221d), (0xb6, 0x2202), (0xb7, 0x2022), (0xb8, 0x00f7),
    (0xb9, 0x2260), (0xba, 0x2261), (0xbb, 0x2248), (0xbc, 0x2026), (0xbd, 0x23d0),
    (0xbe, 0x23af), (0xbf, 0x21b5), (0xc0, 0x2135), (0xc1, 0x2111), (0xc2, 0x211c),
    (0xc3, 0x2118), (0xc4, 0x2297), (0xc5, 0x2295), (0xc6, 0x2205), (0xc7, 0x2229),
    (0xc8, 0x222a), (0xc9, 0x2283), (0xca, 0x2287), (0xcb, 0x2284), (0xcc, 0x2282),
    (0xcd, 0x2286), (0xce, 0x2208), (0xcf, 0x2209), (0xd0, 0x2220), (0xd1, 0x2207),
    (0xd2, 0x00ae), (0xd3, 0x00a9), (0xd4, 0x2122), (0xd5, 0x220f), (0xd6, 0x221a),
    (0xd7, 0x22c5), (0xd8, 0x00ac), (0xd9, 0x2227), (0xda, 0x2228), (0xdb, 0x21d4),
    (0xdc, 0x21d0), (0xdd, 0x21d1), (0xde, 0x21d2), (0xdf, 0x21d3), (0xe0, 0x25ca),
    (0xe1, 0x3008), (0xe2, 0x00ae), (0xe3, 0x00a9), (0xe4, 0x2122), (0xe5, 0x2211),
    (0xf1, 0x3009), (0xf2, 0x222b),
];

/// Maps font ids to names and characters to Unicode.
///
/// Unknown ids can be registered by per-file font tables; fresh ids for
/// name-only references are handed out above the system range.
#[derive(Debug)]
pub struct FontConverter {
    id_to_name: HashMap<i32, String>,
    name_to_id: HashMap<String, i32>,
    next_unique: i32,
}

impl Default for FontConverter {
    fn default() -> Self {
        let mut id_to_name = HashMap::with_capacity(KNOWN_FONTS.len());
        let mut name_to_id = HashMap::with_capacity(KNOWN_FONTS.len());
        for (id, name) in KNOWN_FONTS {
            id_to_name.insert(*id, (*name).to_string());
            name_to_id.insert((*name).to_string(), *id);
        }
        Self { id_to_name, name_to_id, next_unique: 0x7000_0000 }
    }
}

impl FontConverter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The name of a font id, when one is known.
    #[must_use]
    pub fn name(&self, id: i32) -> Option<&str> {
        self.id_to_name.get(&id).map(String::as_str)
    }

    /// Registers a file-local id/name correspondence, overriding the
    /// defaults.
    pub fn set_correspondence(&mut self, id: i32, name: impl Into<String>) {
        let name = name.into();
        self.name_to_id.insert(name.clone(), id);
        self.id_to_name.insert(id, name);
    }

    /// The id of a named font, handing out a fresh id for names never seen
    /// before.
    pub fn id_for_name(&mut self, name: &str) -> i32 {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        self.next_unique += 1;
        let id = self.next_unique;
        self.set_correspondence(id, name);
        id
    }

    /// Decodes one byte of text in the given font.
    ///
    /// The Symbol font carries its own code points; everything else is
    /// treated as Mac Roman, which is also the fallback for unmapped
    /// symbol bytes.
    #[must_use]
    pub fn unicode(&self, font_id: i32, byte: u8) -> Option<char> {
        if font_id == SYMBOL_FONT_ID {
            if let Some(&(_, code)) = SYMBOL_UNICODE.iter().find(|&&(b, _)| b == byte) {
                return char::from_u32(code);
            }
        }
        MAC_ROMAN
            .decode(&[byte], DecoderTrap::Replace)
            .ok()
            .and_then(|decoded| decoded.chars().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_ids_have_names() {
        let fonts = FontConverter::new();
        assert_eq!(fonts.name(3), Some("Geneva"));
        assert_eq!(fonts.name(20), Some("Times"));
        assert_eq!(fonts.name(19), None);
    }

    #[test]
    fn file_tables_override_defaults() {
        let mut fonts = FontConverter::new();
        fonts.set_correspondence(3, "Custom");
        assert_eq!(fonts.name(3), Some("Custom"));
        assert_eq!(fonts.id_for_name("Custom"), 3);
    }

    #[test]
    fn unknown_names_get_fresh_ids() {
        let mut fonts = FontConverter::new();
        let id = fonts.id_for_name("Brand New Face");
        assert!(id > 0x7000_0000);
        assert_eq!(fonts.id_for_name("Brand New Face"), id);
        assert_eq!(fonts.name(id), Some("Brand New Face"));
    }

    #[test]
    fn symbol_font_has_its_own_code_points() {
        let fonts = FontConverter::new();
        assert_eq!(fonts.unicode(SYMBOL_FONT_ID, 0x61), Some('\u{3b1}')); // alpha
        assert_eq!(fonts.unicode(3, 0x61), Some('a'));
        assert_eq!(fonts.unicode(3, 0xa5), Some('\u{2022}')); // Mac Roman bullet
    }
}
