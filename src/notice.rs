//! Status texts shown in the overlay's main slot while a swap is handled.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The swap call is in flight.
    Processing,
    /// The backend found no face on the user's photo.
    NoFaces,
    /// The backend found more than one face on the user's photo.
    TooManyFaces,
    /// Transport failure, timeout or an unexpected reply; a reload follows.
    Error,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Notice::Processing => "YOUR PHOTO IS BEING PROCESSED",
            Notice::NoFaces => "THERE ARE NO FACES ON THE PHOTO. PLEASE CHOOSE ANOTHER ONE",
            Notice::TooManyFaces => {
                "THERE ARE TOO MANY FACES ON THE PHOTO. PLEASE CHOOSE ANOTHER ONE"
            }
            Notice::Error => "AN ERROR OCCURRED. PLEASE TRY AGAIN",
        };
        f.write_str(text)
    }
}
