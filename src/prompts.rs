//! Prompt construction for the two agent roles.
//!
//! The planner designs the series bible and the chapter outlines; the writer
//! produces the full TTS-ready Hindi script of one chapter. Prompt text is
//! Hindi with Devanagari throughout, matching the target audience.

use crate::story::{ChapterOutline, Foundation};

pub fn planner_instructions() -> &'static str {
    "तुम एक हिंदी शैक्षिक मानह्वा कहानी आर्किटेक्ट हो।

तुम्हारी जिम्मेदारी:
- 100 अध्यायों की एक जुड़ी हुई कहानी डिज़ाइन करना
- यादगार, बेहद स्मार्ट और चालाक किरदार बनाना
- ऐसी कहानी बनाना जो साज़िशों, रहस्यों और गहरे बौद्धिक खेल से भरी हो
- हर अध्याय में सस्पेंस और सीख दोनों हों
- पूरी सीरीज़ में कहानी का प्रवाह बनाए रखना

महत्वपूर्ण नियम:
1. सिर्फ JSON फॉर्मेट में जवाब दो - कोई markdown नहीं
2. हर अध्याय पिछले अध्याय से जुड़ा होना चाहिए
3. किरदार बेहद बुद्धिमान और strategic होने चाहिए
4. टोन: डार्क, मैच्योर, और फिलॉसॉफिकल
5. JSON शुरू करो { से या [ से"
}

pub fn writer_instructions() -> &'static str {
    "तुम एक हिंदी शैक्षिक मानह्वा लेखक हो।

लेखन शैली:
- बोलचाल की आधुनिक हिंदी, technical terms के लिए English
- किरदारों की बातचीत बेहद स्मार्ट और clever
- हर दृश्य विस्तार से, सस्पेंस बनाए रखते हुए
- कोई markdown या सिंबल नहीं - सिर्फ बोला जा सकने वाला text
- अध्याय के अंत में सीख की सूची"
}

pub fn foundation_prompt(skill_topic: &str) -> String {
    format!(
        r#"विषय "{topic}" पर 100 अध्यायों की शैक्षिक मानह्वा सीरीज़ का फाउंडेशन बनाओ।

महत्वपूर्ण: सिर्फ JSON ऑब्जेक्ट return करो (array नहीं)।

{{
    "series_title": "रोमांचक सीरीज़ का नाम (देवनागरी में)",
    "skill_topic": "{topic}",
    "story_overview": "500 शब्दों में पूरी कहानी का synopsis: setting, main conflict, character arcs, कैसे सिखाया जाएगा, major plot twists, character growth",
    "main_storyline": "मुख्य कहानी की दिशा जो 100 अध्यायों में फॉलो होगी",
    "world_setting": "कहानी की दुनिया का विस्तृत विवरण",
    "central_conflict": "मुख्य संघर्ष जो पूरी सीरीज़ में चलेगा",
    "characters": [
        {{
            "name": "किरदार का नाम (देवनागरी में)",
            "role": "कहानी में भूमिका",
            "personality": "स्वभाव की विशेषताएं - बेहद स्मार्ट और क्लेवर",
            "intelligence_type": "किस तरह की बुद्धिमत्ता - analytical, strategic, emotional, creative",
            "background": "पृष्ठभूमि की कहानी",
            "character_arc": "पूरी सीरीज़ में कैसे बदलेगा",
            "signature_trait": "उनकी पहचान वाली खासियत"
        }}
    ]
}}

5-7 genius level किरदार बनाओ जो {topic} के अलग पहलुओं को represent करें।
हर किरदार बेहद बुद्धिमान, strategic और clever होना चाहिए।
कोई markdown नहीं, सिर्फ JSON ऑब्जेक्ट।"#,
        topic = skill_topic
    )
}

/// Difficulty label by the first chapter of a batch.
pub fn difficulty_for(start_chapter: u32) -> &'static str {
    if start_chapter <= 20 {
        "शुरुआती"
    } else if start_chapter <= 50 {
        "मध्यम"
    } else if start_chapter <= 75 {
        "उन्नत"
    } else {
        "विशेषज्ञ"
    }
}

pub fn outline_batch_prompt(foundation: &Foundation, start: u32, end: u32) -> String {
    let difficulty = difficulty_for(start);

    let char_names = foundation
        .characters
        .iter()
        .take(5)
        .map(|c| format!("{} ({})", c.name, c.role))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"सीरीज़ "{title}" के अध्याय {start} से {end} का outline बनाओ।

सीरीज़ संदर्भ:
- मुख्य कहानी: {storyline}
- केंद्रीय संघर्ष: {conflict}
- किरदार: {chars}

JSON array return करो:
[
    {{
        "chapter_num": {start},
        "title": "अध्याय का शीर्षक (देवनागरी में)",
        "lesson_focus": "इस अध्याय में मुख्य सीख (2-3 वाक्य)",
        "plot_summary": "मुख्य घटनाएं (5-6 वाक्य, विस्तार से)",
        "character_focus": "किस किरदार का विकास होगा",
        "key_scenes": "4-5 महत्वपूर्ण दृश्य",
        "smart_moments": "किरदारों के बुद्धिमत्ता वाले पल",
        "cliffhanger": "अगले अध्याय के लिए suspense",
        "difficulty": "{difficulty}"
    }}
]

{count} अध्यायों का outline बनाओ।
सिर्फ JSON array, कोई markdown नहीं।"#,
        title = foundation.series_title,
        storyline = foundation.main_storyline,
        conflict = foundation.central_conflict,
        chars = char_names,
        start = start,
        end = end,
        difficulty = difficulty,
        count = end - start + 1,
    )
}

pub fn chapter_prompt(
    foundation: &Foundation,
    outline: &ChapterOutline,
    prev_context: &str,
) -> String {
    let char_info = foundation
        .characters
        .iter()
        .map(|c| {
            let intelligence = if c.intelligence_type.is_empty() {
                "strategic"
            } else {
                &c.intelligence_type
            };
            format!("- {}: {} ({})", c.name, c.personality, intelligence)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"अध्याय {num} का पूरा TTS-ready Hindi script लिखो।

सीरीज़: {title}
मुख्य कहानी: {storyline}

किरदार (सभी genius level):
{chars}

{context}

इस अध्याय की जानकारी:
- शीर्षक: {ch_title}
- सीख: {lesson}
- कहानी: {plot}
- दृश्य: {scenes}
- स्मार्ट moments: {smart}
- किरदार फोकस: {focus}
- अंत: {cliffhanger}

महत्वपूर्ण निर्देश:
1. 6000-8000 शब्दों का विस्तृत script (20-25 मिनट audio)
2. बोलचाल की आधुनिक हिंदी - पुराने शब्द नहीं
3. इंग्लिश नाम/टर्म को देवनागरी में (मार्कस, स्ट्रैटिजी, कमांडर)
4. प्रवाह के लिए अल्पविराम (,) का खूब इस्तेमाल
5. हर दृश्य को विस्तार से बताओ
6. किरदारों की बातचीत बेहद स्मार्ट और clever हो
7. कोई सिंबल नहीं (**, *, ##, (), [])
8. सबक अंत में (5-8 लाइन)
9. पिछले अध्याय से continuity maintain करो
10. कोई जानकारी repeat मत करो, आगे बढ़ाओ

फॉर्मेट:
अध्याय {num}: {ch_title}

[यहाँ 6000-8000 शब्दों की विस्तृत कहानी]

इस अध्याय से सीख
1. पहली सीख
2. दूसरी सीख
...

अब पूरा अध्याय लिखो।"#,
        num = outline.chapter_num,
        title = foundation.series_title,
        storyline = foundation.main_storyline,
        chars = char_info,
        context = prev_context,
        ch_title = outline.title,
        lesson = outline.lesson_focus,
        plot = outline.plot_summary,
        scenes = outline.key_scenes,
        smart = outline.smart_moments,
        focus = outline.character_focus,
        cliffhanger = outline.cliffhanger,
    )
}
