//! ISO 639-2 language names.

/// Returns the English display name of an ISO 639-2 language code, or the
/// code itself when it is not in the table.
pub fn display_name(code: &str) -> &str {
    match code {
        "ara" => "Arabic",
        "bul" => "Bulgarian",
        "cat" => "Catalan",
        "chi" | "zho" => "Chinese",
        "cze" | "ces" => "Czech",
        "dan" => "Danish",
        "dut" | "nld" => "Dutch",
        "eng" => "English",
        "est" => "Estonian",
        "fin" => "Finnish",
        "fre" | "fra" => "French",
        "ger" | "deu" => "German",
        "gre" | "ell" => "Greek",
        "heb" => "Hebrew",
        "hin" => "Hindi",
        "hrv" => "Croatian",
        "hun" => "Hungarian",
        "ice" | "isl" => "Icelandic",
        "ind" => "Indonesian",
        "ita" => "Italian",
        "jpn" => "Japanese",
        "kor" => "Korean",
        "lav" => "Latvian",
        "lit" => "Lithuanian",
        "may" | "msa" => "Malay",
        "nor" => "Norwegian",
        "per" | "fas" => "Persian",
        "pol" => "Polish",
        "por" => "Portuguese",
        "rum" | "ron" => "Romanian",
        "rus" => "Russian",
        "scc" | "srp" => "Serbian",
        "slo" | "slk" => "Slovak",
        "slv" => "Slovenian",
        "spa" => "Spanish",
        "swe" => "Swedish",
        "tha" => "Thai",
        "tur" => "Turkish",
        "ukr" => "Ukrainian",
        "vie" => "Vietnamese",
        "und" => "Undetermined",
        _ => code,
    }
}
