//! Static card content: every line of text on the card, the anniversary quiz
//! and the letter. The text needs a font with Vietnamese glyphs (`CARD_FONT`).

use std::collections::HashSet;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuizOption {
    pub id: &'static str,
    pub label: &'static str,
    pub correct: bool,
}

pub const OPENING_TITLE: &str = "CHÚC MỪNG GIÁNG SINH\nĐOAN XINH YÊU CỦA ANH NHEE !!";
pub const OPENING_SUBTITLE: &str = "Dành riêng cho công chúa của anh";
pub const START_LABEL: &str = "BẤM VÔ ĐÂY";

pub const QUIZ_QUESTION: &str = "Đoan nhớ ngày kỉ niệm\ntụi mình là ngày nào hông taaaa?";

pub const QUIZ_OPTIONS: [QuizOption; 4] = [
    QuizOption { id: "1", label: "10/04/2024", correct: true },
    QuizOption { id: "2", label: "10/05/2024", correct: false },
    QuizOption { id: "3", label: "10/01/2025", correct: false },
    QuizOption { id: "4", label: "10/03/2024", correct: false },
];

/// Shown under the quiz after a wrong pick.
pub const WRONG_ANSWER: &str = "Ư ỉnhhhhhh~ sai rồi kìa, chọn thêm cơ hội nữa";

pub struct Letter {
    pub greeting: &'static str,
    pub body: &'static str,
    pub closing: &'static str,
}

pub const LETTER: Letter = Letter {
    greeting: "Chào Đoan xinh yêu nhất trần đời của anh,",
    body: "Noel này, anh không cần quà gì hết cả, vì anh đã có món quà tuyệt vời nhất \
thế giới là Đoan rồi í.\n\n\
Cảm ơn Đoan vì đã luôn ở bên, lắng nghe, yêu thương và đồng hành cùng anh suốt \
thời gian qua. Anh hứa sẽ luôn làm Đoan cười tươi như những tia nắng ấm áp nhất \
giữa đêm giáng sinh này hehe.\n\n\
Chúc vợ của anh một Giáng sinh ngọt ngào như kẹo dẻo, ấm áp như vòng tay anh \
và luôn hạnh phúc nhất nhé!",
    closing: "Yêu Đoan nhìuuuu nhìuuu lúmmm lúmmm!",
};

pub const CONTINUE_LABEL: &str = "TIẾP TỤC NÈO";

pub const UNWRAP_HEADING: &str = "CHƯA ĐÂU, VẪN CÒN MỘT MÓN QUÀ CUỐI...";
pub const UNWRAP_HINT: &str = "CHẠM ĐỂ MỞ NHÉ!";

pub const FINAL_HEADING: &str = "ĐOAN XUỐNG DƯỚI TRỌ\nLẤY QUÀ NHEEEEE!";
pub const FINAL_MESSAGE: &str = "\"Có một ông già Noel 22 tuổi đang đứng dưới đợi Đoan với với\n\
một bất ngờ cực to bự cho Đoan nà!\"";
pub const REPLAY_LABEL: &str = "CHƯA THẤY RÕ THÌ XEM LẠI NHE KKK";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("quiz needs exactly one correct option, found {0}")]
    CorrectCount(usize),
    #[error("duplicate quiz option id `{0}`")]
    DuplicateId(&'static str),
}

/// Checks the option set invariants: unique ids and exactly one correct answer.
pub fn validate_options(options: &[QuizOption]) -> Result<(), ContentError> {
    let mut seen = HashSet::new();
    for option in options {
        if !seen.insert(option.id) {
            return Err(ContentError::DuplicateId(option.id));
        }
    }

    match options.iter().filter(|o| o.correct).count() {
        1 => Ok(()),
        n => Err(ContentError::CorrectCount(n)),
    }
}
