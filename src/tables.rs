//! Built-in correction tables.
//!
//! Domain rules repair known misreadings of the book's fixed vocabulary and
//! run first. Generic rules repair OCR damage that is not specific to any
//! book and run second. Table order is application order.

use lazy_static::lazy_static;
use regex::Regex;

use crate::rules::CorrectionRule;

fn rule(pattern: &str, replacement: &str) -> CorrectionRule {
    CorrectionRule::from_regex(Regex::new(pattern).unwrap(), replacement)
}

fn rule_in(pattern: &str, replacement: &str, context: &str) -> CorrectionRule {
    rule(pattern, replacement).with_context(Regex::new(context).unwrap())
}

// Pre-compile all tables once, on first use
lazy_static! {
    pub static ref DOMAIN_RULES: Vec<CorrectionRule> = vec![
        // Nichiren
        rule(r"\bNichirend\b", "Nichiren"),
        rule(r"\bNichrn\b", "Nichiren"),
        rule(r"\bNichran\b", "Nichiren"),
        rule(r"\bNitran\b", "Nichiren"),
        rule(r"\bNicbiren\b", "Nichiren"),
        rule(r"\bNkbiren\b", "Nichiren"),

        // Daishonin
        rule(r"\bDaysonan\b", "Daishonin"),
        rule(r"\bDaysonen\b", "Daishonin"),
        rule(r"\bDaysonin\b", "Daishonin"),
        rule(r"\bDayshonan\b", "Daishonin"),
        rule(r"\bDayshoning\b", "Daishonin"),
        rule(r"\bDaishonan\b", "Daishonin"),
        rule(r"\bDatshonin\b", "Daishonin"),
        rule(r"\bDaisbonin\b", "Daishonin"),
        rule(r"\bDysonen\b", "Daishonin"),

        // Nam-myoho-renge-kyo
        rule(r"\bNam-myohoringa\s+Kyol?\b", "Nam-myoho-renge-kyo"),
        rule(r"\bNam-Myoho-Renge-Kyo\b", "Nam-myoho-renge-kyo"),
        rule(r"\bNam-myoho-renge-Kyo\b", "Nam-myoho-renge-kyo"),
        rule(r"\bNam-myoho\s+renge\s+kyo\b", "Nam-myoho-renge-kyo"),
        rule(r"\bNamyoho-renge-kyo\b", "Nam-myoho-renge-kyo"),
        rule(r"\bNammyoho-rengekyo\b", "Nam-myoho-renge-kyo"),
        rule(r"\bNammyoho-renge-kyo\b", "Nam-myoho-renge-kyo"),
        rule(r"\bNam-myohorenge-kyo\b", "Nam-myoho-renge-kyo"),
        rule(r"\bN=\s*myohu-renge-kyo\b", "Nam-myoho-renge-kyo"),
        rule(r"\bNam\s+Yohorenga\b", "Nam-myoho-renge"),
        rule(r"\bNam\s+Yoho\b", "Nam-myoho"),

        // Myoho-renge-kyo
        rule(r"\b[Mm]yhorengeol\b", "Myoho-renge-kyo"),
        rule(r"\b[Mm]yhorengeo\b", "Myoho-renge-kyo"),
        rule(r"\bMyohoringe\b", "Myoho-renge-kyo"),
        rule(r"\bMyohoring\b", "Myoho-renge-kyo"),
        rule(r"\bMiohoringo\b", "Myoho-renge-kyo"),
        rule(r"\bMiohorengeol\b", "Myoho-renge-kyo"),
        rule(r"\bMyo\s+Horengeo\b", "Myoho-renge-kyo"),
        rule(r"\bllohorenge-kyo\b", "Myoho-renge-kyo"),
        rule(r"\bMyohorenge-kyo\b", "Myoho-renge-kyo"),
        rule(r"\bMyoho-renge-l'yo\b", "Myoho-renge-kyo"),
        rule(r"\bMyoho-raige-kyo\b", "Myoho-renge-kyo"),
        rule(r"\bM\}'oho-rmge-l'yo\b", "Myoho-renge-kyo"),
        rule(r"\bMyoho-reng,\S{0,3}\s*kyo\b", "Myoho-renge-kyo"),

        // Buddha, Buddhahood, Buddhist
        rule(r"\bBuddhahhod\b", "Buddhahood"),
        rule(r"\bBtiddhahood\b", "Buddhahood"),
        rule(r"\bBuddbahcwf\b", "Buddhahood"),
        rule(r"\bBuJdhahood\b", "Buddhahood"),
        rule(r"\bBuJJhahood\b", "Buddhahood"),
        rule(r"\bBnddhahood\b", "Buddhahood"),
        rule(r"\bBuddbahond\b", "Buddhahood"),
        rule(r"\bBuddhal1ood\b", "Buddhahood"),
        rule(r"\bB11ddhahood\b", "Buddhahood"),
        rule(r"\bRnddb!st\b", "Buddhist"),
        rule(r"\bBudJ\.h\.l\b", "Buddha"),
        rule(r"\bBuJJha\b", "Buddha"),

        // Shakyamuni, Gongyo, Soka Gakkai
        rule(r"\bShalyamuni\b", "Shakyamuni"),
        rule(r"\bShJkyamunl\b", "Shakyamuni"),
        rule(r"\bShJkyamuni\b", "Shakyamuni"),
        rule(r"\bGonggyo\b", "Gongyo"),
        rule(r"\bGakai\b", "Gakkai"),
        rule(r"\bGak\.kai\b", "Gakkai"),
        rule_in(r"\bSaka\b", "Soka", r"\bSaka\s+(?:University|Gakkai)\b"),

        // Lotus Sutra
        rule(r"\bLotuS\b", "Lotus"),
        rule(r"\blotw\b", "Lotus"),
        rule(r"\bLotui\b", "Lotus"),
        rule(r"\bl otw\b", "Lotus"),
        rule(r"\bl otus\b", "Lotus"),
        rule(r"\bSurr\.1\b", "Sutra"),
        rule(r"\bSutr,1\b", "Sutra"),
        rule(r"\bS111ra\b", "Sutra"),
        rule(r"\bSMlnll\b", "Sutras"),

        // The Writings of Nichiren Daishonin citations
        rule(r"\(wwp-1\b", "(WND-1"),
        rule(r"\(WwND-1\b", "(WND-1"),
        rule(r"\(WNO-I\b", "(WND-1"),
        rule(r"\(WNO\.\s*I\b", "(WND-1"),
        rule(r"\(WND-7\b", "(WND-1"),
        rule(r"\(\\,VND-1\b", "(WND-1"),
        rule(r"\(/\\IWD-1\b", "(WND-1"),
        rule(r"\\,VND\b", "WND"),
        rule(r"/\\IWD\b", "WND"),
        rule(r"\bWND-\s+1\b", "WND-1"),

        // Title and author
        rule(r"\b011 Attaining\b", "On Attaining"),
        rule(r"\bi'ifetime\b", "Lifetime"),
        rule(r"\blkedas\b", "Ikeda's"),
    ];

    static ref LINE_BREAK_HYPHEN: Regex = Regex::new(r"-[ \t]*\r?\n[ \t]*").unwrap();

    pub static ref GENERIC_RULES: Vec<CorrectionRule> = vec![
        // Words split across a line wrap: join the whole chain in one go
        CorrectionRule::stripping(
            Regex::new(r"\w+(?:-[ \t]*\r?\n[ \t]*\w+)+").unwrap(),
            LINE_BREAK_HYPHEN.clone(),
        )
        .with_name("line-wrap hyphenation"),

        // Known breaks that survived as "frag- ment"
        rule(r"\bacti-\s*~?\s*vate\b", "activate"),
        rule(r"\bmani-\s*fests\b", "manifests"),
        rule(r"\benlight-\s*en-\s*ment\b", "enlightenment"),
        rule(r"\benlight-\s*enment\b", "enlightenment"),
        rule(r"\bBud-\s*dha\b", "Buddha"),
        rule(r"\bordi-\s*nary\b", "ordinary"),
        rule(r"\bpeo-\s*ple\b", "people"),
        rule(r"\btrans-\s*migra-\s*tion\b", "transmigration"),
        rule(r"\btrans-\s*migrate\b", "transmigrate"),
        rule(r"\bhu-\s*man\b", "human"),
        rule(r"\breli-\s*gion\b", "religion"),
        rule(r"\bestab-\s*lished\b", "established"),
        rule(r"\bprac-\s*tice\b", "practice"),
        rule(r"\bspiri-\s*tual\b", "spiritual"),
        rule(r"\bnega-\s*tive\b", "negative"),
        rule(r"\bdestruc-\s*tive\b", "destructive"),
        rule(r"\bconvic-\s*tion\b", "conviction"),
        rule(r"\bspon-\s*ta-\s*neously\b", "spontaneously"),
        rule(r"\bfor-\s*mu-\s*lating\b", "formulating"),

        // Garbled tokens with a single known reading
        rule(r"m\.-plen&nt", "resplendent"),
        rule(r"rc\\'olutionary", "revolutionary"),
        rule(r"a\\\.-complishing", "accomplishing"),
        rule(r"<:hanged", "changed"),
        rule(r"prac&--e", "practice"),
        rule(r"prarti\.\.-e", "practice"),
        rule(r",icwed", "viewed"),
        rule(r"\bpractidng\b", "practicing"),
        rule(r"\bhigho1\b", "highest"),
        rule(r"\bronswn\.", "constant,"),
        rule(r#"\ball°"ing\b"#, "allowing"),
        rule(r"\boursel\\-es\b", "ourselves"),
        rule(r"\bdarknes'S\b", "darkness"),
        rule(r"\bdnrkncss\b", "darkness"),
        rule(r"\bonaasing\s*_\.\.\s*1fort\b", "unceasing effort"),
        rule(r"mn<asing\b", "unceasing"),
        rule(r"\bl\\cgativity\b", "negativity"),
        rule(r"\bsigni6cant\b", "significant"),
        rule(r"\b50lll'ce\b", "source"),
        rule(r"\bbunwikind\b", "humankind"),
        rule(r"\btb,rc\b", "there"),
        rule(r"\blivuig\b", "living"),
        rule(r"\bbcms\b", "beings"),
        rule(r"\bnfA1\b", "next"),
        rule(r"\bth\.ough\b", "through"),
        rule(r"\bUDS1l1'pused\b", "unsurpassed"),
        rule(r"\basiured\b", "assured"),
        rule(r"\bcnlightenmenL", "enlightenment."),
        rule(r"\be:ci\.sts\b", "exists"),
        rule(r"\bhwnanity\b", "humanity"),
        rule(r"\\Ve'll\b", "We'll"),
        rule(r"\bprofou7ld\b", "profound"),
        rule(r"\battaini~g\b", "attaining"),
        rule(r"\birl this\b", "in this"),
        rule(r"\bcm, powerfully\b", "can powerfully"),
        rule(r"\btran~fom1\b", "transform"),
        rule(r"\basage\b", "assuage"),
        rule(r"\b1n other\b", "In other"),
        rule(r"\blt[ \t]+means\b", "It means"),
        rule(r"\bi[ \t]+(believe|will|look)\b", "I $1"),
        rule(r"\bI[ \t]+'ll\b", "I'll"),
        rule(r"\bPll\b", "I'll"),

        // Stray glyphs left by the scanner
        rule(r"[ᥥ\u{FFFD}]+", ""),
        rule(r"f#,\.\.\s*\.---.*?---\s*", " "),
        rule(r"◄[ \t]*", ""),

        // Spacing and punctuation
        rule(r"[ \t]{2,}", " "),
        rule(r"(?m)[ \t]+$", ""),
        rule(r"[ \t]+([.,;:])", "$1"),
        rule(r"(\S)[ \t]*\n[ \t]*([,;:])", "$1$2"),
        rule(r",{2,}", ","),
        rule(r"\b\.\.\b", "."),
        rule(r"[ \t]+'s\b", "'s"),
        rule(r"[ \t]+n't\b", "n't"),
    ];
}
