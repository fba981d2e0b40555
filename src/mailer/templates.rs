use crate::error::Error;
use crate::mailer::Mailer;
use crate::models::{Reservation, Room};

impl Mailer {
	/// Queue a "booking confirmed" email for a freshly created reservation
	///
	/// # Errors
	/// Fails if the message cannot be built or the mail queue is full
	#[instrument(skip(self))]
	pub fn send_booking_confirmed(
		&self,
		reservation: &Reservation,
		room: &Room,
	) -> Result<(), Error> {
		let subject = format!("Booking confirmed: room {}", room.name);
		let body = format!(
			"Hello,\n\n\
			 The reservation for room \"{}\" has been confirmed.\n\n\
			 Details:\n\
			 - Date: {}\n\
			 - Period: {} - {}\n\
			 - User: {}\n\n\
			 Thank you for using the room booking system.",
			room.name,
			reservation.start_time.format("%d/%m/%Y"),
			reservation.start_time.format("%H:%M"),
			reservation.end_time.format("%H:%M"),
			reservation.user_identifier,
		);

		let mail = self.try_build_message(&subject, &body)?;

		self.try_send(mail)?;

		info!("queued confirmation email for reservation {}", reservation.id);

		Ok(())
	}

	/// Queue a "booking cancelled" email for a cancelled reservation
	///
	/// # Errors
	/// Fails if the message cannot be built or the mail queue is full
	#[instrument(skip(self))]
	pub fn send_booking_cancelled(
		&self,
		reservation: &Reservation,
		room: &Room,
	) -> Result<(), Error> {
		let subject = format!("Booking cancelled: room {}", room.name);
		let body = format!(
			"Hello,\n\n\
			 The reservation for room \"{}\" has been cancelled.\n\n\
			 Details:\n\
			 - Date: {}\n\
			 - Period: {} - {}\n\
			 - User: {}\n\n\
			 The period is available again.",
			room.name,
			reservation.start_time.format("%d/%m/%Y"),
			reservation.start_time.format("%H:%M"),
			reservation.end_time.format("%H:%M"),
			reservation.user_identifier,
		);

		let mail = self.try_build_message(&subject, &body)?;

		self.try_send(mail)?;

		info!("queued cancellation email for reservation {}", reservation.id);

		Ok(())
	}
}
